//! Feeds the Prometheus registry from the event bus.
//!
//! Subsystems stay free of metric code; every counter here is derived from
//! the events they publish, plus a periodic sample of the retry queue.

use std::sync::Arc;
use std::time::Duration;

use indexer_telemetry::{
    metric_inc, BLOCKS_INDEXED, BLOCKS_REVERTED, INDEXED_HEIGHT, INDEXER_ERRORS, INDEXING_HALTED,
    PENDING_POOL_SIZE, PENDING_REFRESH_FAILURES, RETRY_QUEUE_DEPTH, TRANSACTIONS_INDEXED,
};
use ix_03_account_index::AccountIndexApi;
use shared_bus::{IndexerEvent, Subscription};
use tokio::sync::watch;
use tracing::{debug, info};

/// Apply one bus event to the metrics.
pub fn record(event: &IndexerEvent) {
    match event {
        IndexerEvent::BlockIndexed {
            height,
            transactions,
            ..
        } => {
            metric_inc!(BLOCKS_INDEXED);
            TRANSACTIONS_INDEXED.inc_by(*transactions as f64);
            INDEXED_HEIGHT.set(*height as f64);
        }
        IndexerEvent::BlockReverted { height, .. } => {
            metric_inc!(BLOCKS_REVERTED);
            INDEXED_HEIGHT.set(height.saturating_sub(1) as f64);
        }
        IndexerEvent::IndexingHalted { .. } => {
            INDEXING_HALTED.set(1.0);
            metric_inc!(INDEXER_ERRORS, &["indexing", "halted"]);
        }
        IndexerEvent::PendingSnapshotRefreshed { size } => {
            PENDING_POOL_SIZE.set(*size as f64);
        }
        IndexerEvent::PendingRefreshFailed { .. } => {
            metric_inc!(PENDING_REFRESH_FAILURES);
        }
        IndexerEvent::BlockAccepted { .. }
        | IndexerEvent::BlockDeleted { .. }
        | IndexerEvent::PendingTransactionReceived { .. } => {}
    }
}

pub struct MetricsRecorder {
    accounts: Arc<dyn AccountIndexApi>,
    sample_interval: Duration,
}

impl MetricsRecorder {
    pub fn new(accounts: Arc<dyn AccountIndexApi>, sample_interval: Duration) -> Self {
        Self {
            accounts,
            sample_interval,
        }
    }

    pub async fn run(self, mut events: Subscription, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.sample_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sample_retry_queue(),
                event = events.recv(), if events_open => match event {
                    Some(event) => record(&event),
                    None => events_open = false,
                },
                _ = shutdown.changed() => {
                    info!("Metrics recorder shutting down");
                    break;
                }
            }
        }
    }

    fn sample_retry_queue(&self) {
        match self.accounts.retry_queue_depth() {
            Ok(depth) => RETRY_QUEUE_DEPTH.set(depth as f64),
            Err(e) => debug!(error = %e, "Retry queue depth unavailable"),
        }
    }
}
