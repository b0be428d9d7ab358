//! Refreshes the mirror on a timer and whenever the pool is likely to have
//! changed.

use std::sync::Arc;
use std::time::Duration;

use shared_bus::{EventPublisher, IndexerEvent, Subscription};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::service::{PendingTransactionMirror, RefreshOutcome};

pub struct PendingRefresher {
    mirror: Arc<PendingTransactionMirror>,
    publisher: Arc<dyn EventPublisher>,
    interval: Duration,
}

impl PendingRefresher {
    pub fn new(
        mirror: Arc<PendingTransactionMirror>,
        publisher: Arc<dyn EventPublisher>,
        interval: Duration,
    ) -> Self {
        Self {
            mirror,
            publisher,
            interval,
        }
    }

    /// Run until shutdown. `triggers` should carry node and indexing events.
    pub async fn run(self, mut triggers: Subscription, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_ms = self.interval.as_millis() as u64, "Pending refresher started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh().await,
                event = triggers.recv() => match event {
                    Some(
                        IndexerEvent::BlockIndexed { .. }
                        | IndexerEvent::BlockReverted { .. }
                        | IndexerEvent::PendingTransactionReceived { .. },
                    ) => {
                        self.refresh().await;
                        ticker.reset();
                    }
                    Some(_) => {}
                    None => {
                        debug!("Trigger channel closed, refreshing on timer only");
                        self.run_timer_only(&mut ticker, &mut shutdown).await;
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    info!("Pending refresher shutting down");
                    break;
                }
            }
        }
    }

    async fn run_timer_only(
        &self,
        ticker: &mut tokio::time::Interval,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh().await,
                _ = shutdown.changed() => {
                    info!("Pending refresher shutting down");
                    return;
                }
            }
        }
    }

    async fn refresh(&self) {
        let event = match self.mirror.refresh().await {
            RefreshOutcome::Refreshed { size } => IndexerEvent::PendingSnapshotRefreshed { size },
            RefreshOutcome::Degraded { error, .. } => IndexerEvent::PendingRefreshFailed {
                reason: error.to_string(),
            },
        };
        self.publisher.publish(event).await;
    }
}
