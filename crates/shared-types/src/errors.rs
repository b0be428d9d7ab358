//! # Error Types
//!
//! Parsing errors for identifiers that cross the node boundary as strings.

use thiserror::Error;

/// Errors raised while decoding identifiers received from the node or a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was not valid hexadecimal.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded byte length did not match the identifier width.
    #[error("Invalid length for {kind}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Address did not start with the `lsk` prefix.
    #[error("Invalid address prefix: {0}")]
    InvalidPrefix(String),

    /// Address contained a character outside the lisk32 charset.
    #[error("Invalid address character '{0}'")]
    InvalidCharacter(char),

    /// Address checksum did not verify.
    #[error("Invalid address checksum: {0}")]
    InvalidChecksum(String),

    /// Page size outside the accepted range.
    #[error("Invalid limit {limit}: must be between 1 and {max}")]
    InvalidLimit { limit: usize, max: usize },
}
