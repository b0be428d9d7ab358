//! # Domain Layer
//!
//! Normalized pool transactions, query filters and errors.

pub mod errors;
pub mod query;
pub mod view;

pub use errors::*;
pub use query::*;
pub use view::*;
