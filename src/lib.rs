//! Place Ingestion
//!
//! Harvests pet-friendly place listings from Korean public open-data APIs and
//! reconciles them into a single place catalog.
//!
//! Pipeline per source:
//! 1. [`collector::Collector`] pages through the upstream with a
//!    [`http_client::PageFetcher`], parsing each page with the strategy
//!    registered in [`sources`]
//! 2. [`dedup::partition_batch`] splits the batch into new and existing records
//!    by `(source_api, external_id)`
//! 3. [`writer::UpsertWriter`] inserts or updates each record, counting
//!    failures as skipped
//!
//! [`harvester::Harvester`] sequences the sources and produces a run report.

pub mod collector;
pub mod config;
pub mod dedup;
pub mod error;
pub mod harvester;
pub mod http_client;
pub mod normalize;
pub mod schemas;
pub mod sources;
pub mod storage;
pub mod writer;

pub use collector::{CollectionResult, Collector, PageFetch, StopHandle, StopReason};
pub use config::{Config, SourceConfig};
pub use dedup::{partition_batch, Partition};
pub use error::{IngestionError, Result};
pub use harvester::{Harvester, RunReport, SourceReport};
pub use http_client::{HttpClientConfig, PageFetcher};
pub use schemas::{IdentityKey, NewPlace, PlaceCategory, PlaceRecord, SourceApi, UpsertSummary};
pub use sources::{parse_page, parser_for, ParsedPage, SourceParser};
pub use storage::{MemoryPlaceStore, PgPlaceStore, PlaceStore};
pub use writer::UpsertWriter;
