//! # Ports Layer
//!
//! - **Inbound**: `AccountIndexApi`, what the indexing engine and query
//!   surfaces call
//! - **Outbound**: `TimeSource` for stamping retry entries

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
