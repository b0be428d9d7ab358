//! # Domain Layer
//!
//! Query shapes, outcomes and errors of the account index.

pub mod errors;
pub mod query;

pub use errors::*;
pub use query::*;
