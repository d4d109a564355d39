//! Upsert Writer
//!
//! Applies a partitioned batch to the catalog. New records are inserted with a
//! fresh id and slug; existing records have their mutable fields rewritten.
//! Every record ends up counted as exactly one of added, updated or skipped.
//! A failing record never aborts the rest of the batch.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dedup::Partition;
use crate::normalize::place_slug;
use crate::schemas::{NewPlace, PlaceRecord, UpsertSummary};
use crate::storage::PlaceStore;

pub struct UpsertWriter {
    store: Arc<dyn PlaceStore>,
}

impl UpsertWriter {
    pub fn new(store: Arc<dyn PlaceStore>) -> Self {
        Self { store }
    }

    /// Inserts `partition.new`, then updates `partition.existing`
    #[instrument(skip_all, fields(new = partition.new.len(), existing = partition.existing.len()))]
    pub async fn write(&self, partition: Partition) -> UpsertSummary {
        let mut summary = UpsertSummary::with_total(partition.len());

        for record in partition.new {
            if self.insert(record).await {
                summary.added += 1;
            } else {
                summary.skipped += 1;
            }
        }

        for record in partition.existing {
            if self.update(&record).await {
                summary.updated += 1;
            } else {
                summary.skipped += 1;
            }
        }

        info!(
            total = summary.total,
            added = summary.added,
            updated = summary.updated,
            skipped = summary.skipped,
            "Batch written"
        );

        summary
    }

    async fn insert(&self, record: PlaceRecord) -> bool {
        let id = Uuid::new_v4();
        let place = NewPlace {
            id,
            slug: place_slug(&record.name, &id),
            record,
            collected_at: Utc::now(),
        };

        match self.store.insert_place(&place).await {
            Ok(()) => {
                debug!(key = %place.record.identity_key(), slug = %place.slug, "Inserted place");
                true
            }
            Err(e) if e.is_conflict() => {
                warn!(
                    key = %place.record.identity_key(),
                    "Identity key inserted concurrently, skipping"
                );
                false
            }
            Err(e) => {
                warn!(
                    key = %place.record.identity_key(),
                    cause = e.kind(),
                    error = %e,
                    "Insert failed, skipping"
                );
                false
            }
        }
    }

    async fn update(&self, record: &PlaceRecord) -> bool {
        match self.store.update_place(record, Utc::now()).await {
            Ok(true) => {
                debug!(key = %record.identity_key(), "Updated place");
                true
            }
            Ok(false) => {
                warn!(key = %record.identity_key(), "Place vanished before update, skipping");
                false
            }
            Err(e) => {
                warn!(
                    key = %record.identity_key(),
                    cause = e.kind(),
                    error = %e,
                    "Update failed, skipping"
                );
                false
            }
        }
    }
}
