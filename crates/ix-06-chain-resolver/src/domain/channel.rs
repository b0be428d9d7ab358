//! Channel metadata and routing.

use serde::{Deserialize, Serialize};
use shared_types::ChainId;

use super::errors::ChainResolverError;

/// One side of a channel's message tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageTree {
    pub append_path: Vec<String>,
    pub root: String,
    pub size: u64,
}

/// Cross-chain messaging state between the local chain and a partner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelInfo {
    pub inbox: MessageTree,
    pub outbox: MessageTree,
    pub partner_chain_outbox_root: String,
    #[serde(rename = "messageFeeTokenID")]
    pub message_fee_token_id: String,
    pub min_return_fee_per_byte: String,
}

/// Where a channel lookup is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRoute {
    /// The local node holds the channel.
    Local,
    /// Only the network's mainchain knows it; ask its public service.
    Delegated,
}

impl ChannelRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelRoute::Local => "local",
            ChannelRoute::Delegated => "delegated",
        }
    }
}

/// Decide where the channel between `current` and `target` lives.
///
/// A mainchain holds channels to every sidechain and each sidechain holds
/// its channel to the mainchain. Sidechain-to-sidechain lookups go through
/// the mainchain.
pub fn route(current: &ChainId, target: &ChainId) -> Result<ChannelRoute, ChainResolverError> {
    if current == target {
        return Err(ChainResolverError::SelfReference(*target));
    }
    if current.is_mainchain() != target.is_mainchain() {
        Ok(ChannelRoute::Local)
    } else {
        Ok(ChannelRoute::Delegated)
    }
}

/// A channel together with the route that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub route: ChannelRoute,
    pub channel: ChannelInfo,
}
