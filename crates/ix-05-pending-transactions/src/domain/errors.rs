//! Error types for the pending-transaction mirror.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PendingError {
    /// Page size outside `1..=100`.
    #[error("Invalid limit {0}: must be between 1 and 100")]
    InvalidLimit(usize),

    /// Unparseable sort expression.
    #[error("Invalid sort '{0}': expected fee, nonce or id with :asc or :desc")]
    InvalidSort(String),

    /// The node did not answer within the refresh timeout.
    #[error("Transaction pool request timed out after {0} ms")]
    Timeout(u64),

    /// The node answered with an error.
    #[error("Transaction pool unavailable: {0}")]
    Source(String),
}

impl PendingError {
    pub fn is_usage(&self) -> bool {
        matches!(self, PendingError::InvalidLimit(_) | PendingError::InvalidSort(_))
    }
}
