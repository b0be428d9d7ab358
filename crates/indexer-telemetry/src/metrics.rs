//! Prometheus metrics for the indexer.
//!
//! All metrics follow the naming convention: `ix_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // BLOCK INDEXING
    // =========================================================================

    /// Blocks whose effects were committed
    pub static ref BLOCKS_INDEXED: Counter = Counter::new(
        "ix_blocks_indexed_total",
        "Total number of blocks indexed"
    ).expect("metric creation failed");

    /// Blocks whose effects were undone
    pub static ref BLOCKS_REVERTED: Counter = Counter::new(
        "ix_blocks_reverted_total",
        "Total number of blocks reverted during reorgs"
    ).expect("metric creation failed");

    /// Transactions indexed, including skipped failed ones
    pub static ref TRANSACTIONS_INDEXED: Counter = Counter::new(
        "ix_transactions_indexed_total",
        "Total number of transactions seen in indexed blocks"
    ).expect("metric creation failed");

    /// Highest indexed height
    pub static ref INDEXED_HEIGHT: Gauge = Gauge::new(
        "ix_indexed_height",
        "Height of the last indexed block"
    ).expect("metric creation failed");

    /// 1 while indexing is halted on a fatal error
    pub static ref INDEXING_HALTED: Gauge = Gauge::new(
        "ix_indexing_halted",
        "Set to 1 when indexing stopped and needs operator attention"
    ).expect("metric creation failed");

    /// Time to index one block
    pub static ref BLOCK_INDEX_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ix_block_index_duration_seconds",
            "Time spent indexing a block"
        ).buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
    ).expect("metric creation failed");

    // =========================================================================
    // ACCOUNT INDEX
    // =========================================================================

    /// Public keys waiting in the retry queue
    pub static ref RETRY_QUEUE_DEPTH: Gauge = Gauge::new(
        "ix_account_retry_queue_depth",
        "Public keys waiting to be indexed"
    ).expect("metric creation failed");

    // =========================================================================
    // PENDING POOL
    // =========================================================================

    /// Transactions in the served snapshot
    pub static ref PENDING_POOL_SIZE: Gauge = Gauge::new(
        "ix_pending_pool_size",
        "Transactions in the current pending snapshot"
    ).expect("metric creation failed");

    /// Refreshes that kept the previous snapshot
    pub static ref PENDING_REFRESH_FAILURES: Counter = Counter::new(
        "ix_pending_refresh_failures_total",
        "Pending pool refreshes that failed"
    ).expect("metric creation failed");

    // =========================================================================
    // CROSS-CHAIN
    // =========================================================================

    /// Channel lookups by route
    pub static ref CHANNEL_RESOLUTIONS: CounterVec = CounterVec::new(
        Opts::new("ix_channel_resolutions_total", "Channel lookups by route and outcome"),
        &["route", "outcome"]
    ).expect("metric creation failed");

    // =========================================================================
    // ERRORS
    // =========================================================================

    /// Errors by component and kind
    pub static ref INDEXER_ERRORS: CounterVec = CounterVec::new(
        Opts::new("ix_errors_total", "Errors by component and kind"),
        &["component", "kind"]
    ).expect("metric creation failed");
}

/// Handle to the registered metric set.
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    /// Registry the metrics were registered with.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Block indexing
        Box::new(BLOCKS_INDEXED.clone()),
        Box::new(BLOCKS_REVERTED.clone()),
        Box::new(TRANSACTIONS_INDEXED.clone()),
        Box::new(INDEXED_HEIGHT.clone()),
        Box::new(INDEXING_HALTED.clone()),
        Box::new(BLOCK_INDEX_DURATION.clone()),
        // Accounts
        Box::new(RETRY_QUEUE_DEPTH.clone()),
        // Pending pool
        Box::new(PENDING_POOL_SIZE.clone()),
        Box::new(PENDING_REFRESH_FAILURES.clone()),
        // Cross-chain
        Box::new(CHANNEL_RESOLUTIONS.clone()),
        // Errors
        Box::new(INDEXER_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}
