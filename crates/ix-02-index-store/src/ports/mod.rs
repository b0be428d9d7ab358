//! # Ports Layer
//!
//! - **Driven Ports (Outbound)**: the ordered key-value store every table
//!   lives in. Production: `RocksDbStore` (indexer-runtime). Testing:
//!   [`InMemoryKVStore`].

pub mod outbound;

pub use outbound::*;
