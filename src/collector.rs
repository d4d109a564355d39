//! Collection Loop
//!
//! Walks one source page by page (1-based) until the upstream runs dry, the
//! page ceiling is reached, a page fails, or a stop is requested. Records from
//! pages fetched before a failure are kept.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

use crate::config::SourceConfig;
use crate::error::Result;
use crate::schemas::{PlaceRecord, SourceApi};
use crate::sources::ParsedPage;

/// Fetches and parses a single page of a source
#[async_trait]
pub trait PageFetch: Send + Sync {
    async fn fetch_page(&self, source: &SourceConfig, page: u32) -> Result<ParsedPage>;
}

/// Why a collection loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back with no records
    Exhausted,
    /// The configured page ceiling was reached
    PageCeiling,
    /// A page request or its envelope failed
    FetchFailed,
    /// Stop was requested from outside
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::PageCeiling => "page_ceiling",
            StopReason::FetchFailed => "fetch_failed",
            StopReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything gathered from one source
#[derive(Debug, Clone)]
pub struct CollectionResult {
    pub api: SourceApi,
    pub records: Vec<PlaceRecord>,
    /// Page requests issued, including the empty or failed final one
    pub pages_fetched: u32,
    pub items_dropped: usize,
    pub stop_reason: StopReason,
    /// Message of the failure that ended the loop, if any
    pub error: Option<String>,
    pub elapsed: Duration,
}

/// Requests a running collector to stop at its next checkpoint
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Paginates sources through a [`PageFetch`] implementation
pub struct Collector<F: PageFetch> {
    fetcher: F,
    page_delay: Duration,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl<F: PageFetch> Collector<F> {
    pub fn new(fetcher: F, page_delay: Duration) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            fetcher,
            page_delay,
            stop_tx: Arc::new(stop_tx),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    /// Stops the loop before its next page or during its current delay
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Sleeps for `delay`, waking early on stop. Returns true if stopped.
    pub async fn pause(&self, delay: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        if delay.is_zero() {
            return false;
        }

        let mut rx = self.stop_tx.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = rx.wait_for(|stopped| *stopped) => {}
        }
        self.is_stopped()
    }

    /// Collects every page of `source`.
    ///
    /// Fails only when the source is not usable (missing credential or
    /// endpoint); in that case no request is issued. Page failures end the
    /// loop and are reported in the result.
    #[instrument(skip(self, source), fields(source = %source.api))]
    pub async fn collect(&self, source: &SourceConfig) -> Result<CollectionResult> {
        source.ensure_usable()?;

        let started = Instant::now();
        let mut result = CollectionResult {
            api: source.api,
            records: Vec::new(),
            pages_fetched: 0,
            items_dropped: 0,
            stop_reason: StopReason::PageCeiling,
            error: None,
            elapsed: Duration::ZERO,
        };

        info!(
            page_size = source.page_size,
            max_pages = source.max_pages,
            "Starting collection"
        );

        let mut page = 1u32;
        while page <= source.max_pages {
            if self.is_stopped() {
                result.stop_reason = StopReason::Cancelled;
                break;
            }

            result.pages_fetched += 1;
            match self.fetcher.fetch_page(source, page).await {
                Ok(parsed) => {
                    result.items_dropped += parsed.dropped;
                    if parsed.is_empty() {
                        debug!(page, "Empty page, source exhausted");
                        result.stop_reason = StopReason::Exhausted;
                        break;
                    }

                    debug!(page, records = parsed.len(), "Page collected");
                    result.records.extend(parsed.records);
                }
                Err(e) => {
                    error!(
                        page,
                        cause = e.kind(),
                        error = %e,
                        kept = result.records.len(),
                        "Page fetch failed, stopping source"
                    );
                    result.stop_reason = StopReason::FetchFailed;
                    result.error = Some(e.to_string());
                    break;
                }
            }

            page += 1;
            if page <= source.max_pages && self.pause(self.page_delay).await {
                result.stop_reason = StopReason::Cancelled;
                break;
            }
        }

        result.elapsed = started.elapsed();

        info!(
            records = result.records.len(),
            pages = result.pages_fetched,
            dropped = result.items_dropped,
            stop_reason = %result.stop_reason,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Collection finished"
        );

        Ok(result)
    }
}
