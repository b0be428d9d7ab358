//! Error types for reward computation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    /// Fixed-point division by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Intermediate or final value does not fit the target width.
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Commission larger than the reward it was taken from.
    #[error("Commission {commission} exceeds block reward {reward}")]
    CommissionExceedsReward { commission: u64, reward: u64 },

    /// Stored commission rate outside 0..=MAX_COMMISSION.
    #[error("Commission rate {0} out of range")]
    InvalidRate(u16),

    /// Reading commission history or stakes failed.
    #[error("Lookup failed: {0}")]
    Lookup(String),
}
