//! # Outbound Ports

use async_trait::async_trait;
use shared_types::ChainId;

use crate::domain::{ChainResolverError, ChannelInfo};

/// Reports the chain the local node runs.
#[async_trait]
pub trait NodeInfoSource: Send + Sync {
    async fn chain_id(&self) -> Result<ChainId, ChainResolverError>;
}

/// Answers `getChannel` for a partner chain.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn get_channel(&self, chain_id: &ChainId) -> Result<ChannelInfo, ChainResolverError>;
}
