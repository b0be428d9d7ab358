//! Error types for chain identity and channel resolution.

use shared_types::ChainId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainResolverError {
    /// The local chain id has not been resolved yet.
    #[error("Chain id not resolved")]
    Unresolved,

    /// A chain cannot open a channel to itself.
    #[error("Cannot resolve a channel to the local chain {0}")]
    SelfReference(ChainId),

    /// No mainchain service is known for the network and none was configured.
    #[error("No mainchain service URL for network {0:02x}")]
    UnknownNetwork(u8),

    /// The local node failed to answer.
    #[error("Node request failed: {0}")]
    Node(String),

    /// The remote mainchain service answered with an error.
    #[error("Mainchain service error: {0}")]
    Remote(String),

    /// The request could not be delivered or timed out.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The answer did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ChainResolverError {
    /// Errors caused by the caller rather than the environment.
    pub fn is_usage(&self) -> bool {
        matches!(self, ChainResolverError::SelfReference(_))
    }
}
