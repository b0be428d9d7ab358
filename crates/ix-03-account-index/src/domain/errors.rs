//! Error types for the account index.

use ix_02_index_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountIndexError {
    /// Reading or writing the underlying tables failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The caller supplied an invalid query. Never retried.
    #[error("Usage error: {0}")]
    Usage(String),
}

impl AccountIndexError {
    pub fn is_usage(&self) -> bool {
        matches!(self, AccountIndexError::Usage(_))
    }
}
