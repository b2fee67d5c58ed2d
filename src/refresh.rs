use crate::catalog::{CatalogEntry, CatalogStore};
use crate::metrics::CatalogMetrics;
use crate::types::CatalogSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Fetching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot is live. `dropped` counts records that did not make it in.
    Replaced { entries: usize, dropped: usize },
    /// The fetch failed; the prior snapshot stays.
    Failed(String),
    /// Another refresh was already in flight.
    Skipped,
}

/// Reloads the catalog at startup and on a fixed interval, one fetch at a time.
pub struct RefreshScheduler {
    catalog: Arc<CatalogStore>,
    source: Arc<dyn CatalogSource>,
    interval: Duration,
    fetching: AtomicBool,
}

struct FetchingGuard<'a>(&'a AtomicBool);

impl Drop for FetchingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RefreshScheduler {
    pub fn new(
        catalog: Arc<CatalogStore>,
        source: Arc<dyn CatalogSource>,
        interval: Duration,
    ) -> Self {
        Self {
            catalog,
            source,
            interval,
            fetching: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> RefreshState {
        if self.fetching.load(Ordering::Acquire) {
            RefreshState::Fetching
        } else {
            RefreshState::Idle
        }
    }

    /// Fetch, parse, filter and swap. A call made while another is running returns
    /// [`RefreshOutcome::Skipped`] without touching the source.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Catalog refresh already in flight, skipping trigger");
            CatalogMetrics::record_refresh_skipped();
            return RefreshOutcome::Skipped;
        }
        let _guard = FetchingGuard(&self.fetching);

        info!("Loading stickers");
        let started = Instant::now();
        match self.source.fetch().await {
            Ok(records) => {
                let total = records.len();
                let entries: Vec<CatalogEntry> = records
                    .into_iter()
                    .filter_map(CatalogEntry::from_record)
                    .collect();
                let kept = self.catalog.replace(entries);
                let dropped = total - kept;
                info!("Got {} stickers ({} records dropped)", kept, dropped);
                CatalogMetrics::record_refresh_success(
                    started.elapsed().as_secs_f64(),
                    kept,
                    dropped,
                );
                RefreshOutcome::Replaced {
                    entries: kept,
                    dropped,
                }
            }
            Err(e) => {
                error!(error = %e, "Error fetching stickers, keeping {} current entries", self.catalog.len());
                CatalogMetrics::record_refresh_error(started.elapsed().as_secs_f64());
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    /// Runs the schedule: the first tick fires immediately, later ticks every `interval`.
    /// Each refresh runs in its own task so a slow fetch makes later ticks skip instead of
    /// queueing. Aborting the returned handle also cancels any refresh still in flight.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Refreshing catalog every {:?}", self.interval);
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // Dropping the set aborts its tasks.
            let mut in_flight = JoinSet::new();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let scheduler = self.clone();
                        in_flight.spawn(async move {
                            scheduler.refresh().await;
                        });
                    }
                    Some(_) = in_flight.join_next() => {}
                }
            }
        })
    }
}
