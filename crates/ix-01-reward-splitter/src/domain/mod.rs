//! # Domain Layer
//!
//! Pure fixed-point arithmetic and the reward formulas built on it. No I/O.

pub mod errors;
pub mod q96;
pub mod reward;

pub use errors::*;
pub use q96::Q96;
pub use reward::*;
