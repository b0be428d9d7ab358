//! Periodic retry-queue drain.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ports::AccountIndexApi;

/// Drains the retry queue on a fixed interval until shutdown.
pub struct RetryWorker {
    index: Arc<dyn AccountIndexApi>,
    interval: Duration,
}

impl RetryWorker {
    pub fn new(index: Arc<dyn AccountIndexApi>, interval: Duration) -> Self {
        Self { index, interval }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_ms = self.interval.as_millis() as u64, "Retry worker started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.index.drain_retry_queue() {
                        Ok(report) if report.remaining > 0 => {
                            debug!(remaining = report.remaining, "Retry queue not empty");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Retry queue drain failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Retry worker shutting down");
                    break;
                }
            }
        }
    }
}
