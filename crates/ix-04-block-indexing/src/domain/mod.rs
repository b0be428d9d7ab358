//! # Domain Layer

pub mod context;
pub mod errors;
pub mod metadata;

pub use context::*;
pub use errors::*;
pub use metadata::*;
