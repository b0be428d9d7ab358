//! Error types for the index store.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    Io { message: String },

    /// Stored bytes do not match the expected layout.
    #[error("KV store corruption: {message}")]
    Corruption { message: String },

    /// A record failed to encode or decode.
    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}

impl From<shared_types::ParseError> for StoreError {
    fn from(e: shared_types::ParseError) -> Self {
        StoreError::Corruption {
            message: e.to_string(),
        }
    }
}
