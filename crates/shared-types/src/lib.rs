//! # Shared Types Crate
//!
//! Entities received from the node and the derived index records written by
//! the indexing subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-subsystem type is defined here.
//! - **Wire-compatible serde**: identifiers serialize exactly as the node
//!   renders them (hex, lisk32 addresses, decimal-string amounts).

pub mod address;
pub mod entities;
pub mod errors;
pub mod pagination;
pub mod records;

pub use address::{Address, ADDRESS_LENGTH};
pub use entities::*;
pub use errors::*;
pub use pagination::{Page, PageMeta, Pagination, DEFAULT_LIMIT, MAX_LIMIT};
pub use records::*;
