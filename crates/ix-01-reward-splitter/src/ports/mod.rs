//! # Ports Layer
//!
//! - **Driven Ports (Outbound)**: commission history and stake lookups,
//!   implemented by the index store.

pub mod outbound;

pub use outbound::*;
