//! # Indexer Runtime Library
//!
//! Wires the indexing subsystems to a live node. The `chain-indexer`
//! binary in `main.rs` is a thin CLI over [`IndexerRuntime`].
//!
//! ## Task Layout
//!
//! ```text
//! node WS ──→ NodeEventSubscriber ──→ bus ──┬──→ BlockSynchronizer ──→ BlockIndexingEngine
//!                                           ├──→ PendingRefresher ───→ PendingTransactionMirror
//!                                           └──→ MetricsRecorder
//! RetryWorker ──(interval)──→ AccountIndex::drain_retry_queue
//! ```
//!
//! Every task shares one `watch` shutdown channel. The binary also stops when
//! the bus latches an indexing halt.

pub mod adapters;
pub mod config;
pub mod metrics;
pub mod runtime;
pub mod sync;

pub use config::{ConfigError, IndexerConfig};
pub use runtime::IndexerRuntime;
pub use sync::{BlockSource, BlockSynchronizer, SyncError, SyncSettings};
