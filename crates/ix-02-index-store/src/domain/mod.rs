//! # Domain Layer
//!
//! Storage errors, the physical key layout and stored-only entities.

pub mod entities;
pub mod errors;
pub mod keys;

pub use entities::*;
pub use errors::*;
