//! Batch Deduplication
//!
//! Splits a collected batch into records that are new to the catalog and
//! records that already exist, keyed by `(source_api, external_id)`. Existence
//! is resolved with one batched lookup, never one query per record.

use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::schemas::PlaceRecord;
use crate::storage::PlaceStore;

/// A batch split by catalog membership. Order within each side follows the
/// input batch.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub new: Vec<PlaceRecord>,
    pub existing: Vec<PlaceRecord>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.new.len() + self.existing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.existing.is_empty()
    }
}

/// Partitions `batch` against the store.
///
/// Records sharing an identity key within the batch all land on the same side;
/// when that side is `new`, the second insert loses on the unique constraint
/// and the writer counts it as skipped.
#[instrument(skip_all, fields(batch = batch.len()))]
pub async fn partition_batch(store: &dyn PlaceStore, batch: Vec<PlaceRecord>) -> Result<Partition> {
    if batch.is_empty() {
        return Ok(Partition::default());
    }

    let mut seen = HashSet::with_capacity(batch.len());
    let keys: Vec<_> = batch
        .iter()
        .map(PlaceRecord::identity_key)
        .filter(|key| seen.insert(key.clone()))
        .collect();

    let existing_keys = store.existing_keys(&keys).await?;

    let (existing, new): (Vec<_>, Vec<_>) = batch
        .into_iter()
        .partition(|record| existing_keys.contains(&record.identity_key()));

    debug!(new = new.len(), existing = existing.len(), "Batch partitioned");

    Ok(Partition { new, existing })
}
