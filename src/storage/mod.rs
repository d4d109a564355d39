//! Storage layer for the place catalog
//!
//! The catalog is keyed by `(source_api, external_id)`, enforced by a unique
//! constraint. [`PlaceStore`] is the seam the deduplicator and writer talk to;
//! [`PgPlaceStore`] backs it with Postgres and [`MemoryPlaceStore`] keeps
//! everything in process for dry runs and tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::Result;
use crate::schemas::{IdentityKey, NewPlace, PlaceRecord};

pub use memory::{InjectedFailure, MemoryPlaceStore, StoredPlace};
pub use postgres::PgPlaceStore;

/// Persistence operations needed by the pipeline
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Which of `keys` already exist, answered in a single round trip
    async fn existing_keys(&self, keys: &[IdentityKey]) -> Result<HashSet<IdentityKey>>;

    /// Inserts a new place. A concurrent insert of the same identity key
    /// surfaces as `IngestionError::DuplicateKey`.
    async fn insert_place(&self, place: &NewPlace) -> Result<()>;

    /// Rewrites the mutable fields of the place matching the record's identity
    /// key. Returns false when no row matched.
    async fn update_place(&self, record: &PlaceRecord, updated_at: DateTime<Utc>) -> Result<bool>;

    /// Number of places in the catalog
    async fn count(&self) -> Result<u64>;
}
