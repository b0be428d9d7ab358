//! # Chain Indexer Test Suite
//!
//! Cross-crate flows that no single subsystem can exercise alone.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Block builders, mock node, flaky store
//! └── integration/
//!     ├── indexing.rs   # Engine + account index + synchronizer
//!     ├── rewards.rs    # Reward split against indexed history
//!     ├── accounts.rs   # Identity writes and the retry queue
//!     ├── pending.rs    # Pool mirror over the account index
//!     ├── chain.rs      # Chain identity and channel routing
//!     └── node_flow.rs  # Node notifications, halting, config layering
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ix-tests
//! cargo test -p ix-tests integration::indexing::
//! ```

pub mod fixtures;

#[cfg(test)]
mod integration;
