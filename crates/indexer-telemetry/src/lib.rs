//! # Indexer Telemetry
//!
//! Structured logging and Prometheus metrics for the indexer process.
//! Subsystem crates only emit `tracing` events; this crate installs the
//! subscriber and owns the metric registry, which the runtime feeds from
//! the event bus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use indexer_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IX_SERVICE_NAME` | `chain-indexer` | Service name attached to logs |
//! | `IX_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `IX_JSON_LOGS` | `false` | Emit JSON logs |

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, HistogramTimer, MetricsHandle, BLOCKS_INDEXED,
    BLOCKS_REVERTED, BLOCK_INDEX_DURATION, CHANNEL_RESOLUTIONS, INDEXED_HEIGHT, INDEXER_ERRORS,
    INDEXING_HALTED, PENDING_POOL_SIZE, PENDING_REFRESH_FAILURES, REGISTRY, RETRY_QUEUE_DEPTH,
    TRANSACTIONS_INDEXED,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and register metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard { metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

/// Convenience macro for creating a span with component context.
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
