//! Harvest orchestration
//!
//! Runs the pipeline for each source in turn:
//! collect pages, partition against the catalog, write the batch.
//! Sources run sequentially with a pause between them. A failing source is
//! reported and the run moves on to the next one.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::collector::{Collector, PageFetch, StopHandle, StopReason};
use crate::config::SourceConfig;
use crate::dedup::partition_batch;
use crate::error::Result;
use crate::schemas::{SourceApi, UpsertSummary};
use crate::storage::PlaceStore;
use crate::writer::UpsertWriter;

/// Outcome of one source
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub api: SourceApi,
    /// Records parsed from the upstream
    pub collected: usize,
    pub pages_fetched: u32,
    pub items_dropped: usize,
    /// `None` when the source failed before paging started
    pub stop_reason: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub summary: UpsertSummary,
}

impl SourceReport {
    fn failed(api: SourceApi, error: String) -> Self {
        Self {
            api,
            collected: 0,
            pages_fetched: 0,
            items_dropped: 0,
            stop_reason: None,
            error: Some(error),
            summary: UpsertSummary::default(),
        }
    }
}

/// Outcome of a multi-source run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub total: UpsertSummary,
}

impl RunReport {
    pub fn collected(&self) -> usize {
        self.sources.iter().map(|s| s.collected).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }

    fn push(&mut self, report: SourceReport) {
        self.total += report.summary;
        self.sources.push(report);
    }
}

/// Place harvester
pub struct Harvester<F: PageFetch> {
    collector: Collector<F>,
    store: Arc<dyn PlaceStore>,
    writer: UpsertWriter,
    source_delay: Duration,
}

impl<F: PageFetch> Harvester<F> {
    pub fn new(fetcher: F, store: Arc<dyn PlaceStore>, page_delay: Duration, source_delay: Duration) -> Self {
        Self {
            collector: Collector::new(fetcher, page_delay),
            writer: UpsertWriter::new(store.clone()),
            store,
            source_delay,
        }
    }

    /// Handle for stopping the run from a signal handler
    pub fn stop_handle(&self) -> StopHandle {
        self.collector.stop_handle()
    }

    /// Collects, partitions and writes one source.
    ///
    /// Records collected before a page failure are still written.
    #[instrument(skip(self, source), fields(source = %source.api))]
    pub async fn harvest_source(&self, source: &SourceConfig) -> Result<SourceReport> {
        let collection = self.collector.collect(source).await?;
        let collected = collection.records.len();

        let partition = partition_batch(self.store.as_ref(), collection.records).await?;
        let summary = self.writer.write(partition).await;

        info!(
            collected,
            added = summary.added,
            updated = summary.updated,
            skipped = summary.skipped,
            stop_reason = %collection.stop_reason,
            "Source harvested"
        );

        Ok(SourceReport {
            api: source.api,
            collected,
            pages_fetched: collection.pages_fetched,
            items_dropped: collection.items_dropped,
            stop_reason: Some(collection.stop_reason),
            error: collection.error,
            summary,
        })
    }

    /// Harvests every source in order, pausing between sources
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub async fn run(&self, sources: &[SourceConfig]) -> RunReport {
        info!("Starting harvest run...");
        let mut report = RunReport::default();

        for (index, source) in sources.iter().enumerate() {
            if index > 0 && self.collector.pause(self.source_delay).await {
                warn!("Stop requested, skipping remaining sources");
                break;
            }

            match self.harvest_source(source).await {
                Ok(source_report) => report.push(source_report),
                Err(e) => {
                    error!(source = %source.api, cause = e.kind(), error = %e, "Source harvest failed");
                    report.push(SourceReport::failed(source.api, e.to_string()));
                }
            }
        }

        info!(
            sources = report.sources.len(),
            failed = report.failed_sources(),
            collected = report.collected(),
            added = report.total.added,
            updated = report.total.updated,
            skipped = report.total.skipped,
            "Harvest run completed"
        );

        report
    }
}
