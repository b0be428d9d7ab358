//! # Chain Context and Channel Resolver

use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::ChainId;
use tracing::{debug, info};

use crate::domain::{route, ChainResolverError, ChannelRoute, ResolvedChannel};
use crate::ports::{ChannelSource, NodeInfoSource};

/// The local chain id, resolved once and shared by handle.
#[derive(Debug, Default)]
pub struct ChainContext {
    chain_id: RwLock<Option<ChainId>>,
}

impl ChainContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that is already resolved.
    pub fn with_chain_id(chain_id: ChainId) -> Self {
        Self {
            chain_id: RwLock::new(Some(chain_id)),
        }
    }

    /// Return the cached id, asking `source` only when none is cached.
    pub async fn resolve(
        &self,
        source: &dyn NodeInfoSource,
    ) -> Result<ChainId, ChainResolverError> {
        if let Some(chain_id) = *self.chain_id.read() {
            return Ok(chain_id);
        }
        self.refresh(source).await
    }

    /// Ask `source` again and replace the cached id.
    pub async fn refresh(
        &self,
        source: &dyn NodeInfoSource,
    ) -> Result<ChainId, ChainResolverError> {
        let chain_id = source.chain_id().await?;
        let previous = self.chain_id.write().replace(chain_id);
        if previous != Some(chain_id) {
            info!(chain_id = %chain_id, mainchain = chain_id.is_mainchain(), "Chain id resolved");
        }
        Ok(chain_id)
    }

    pub fn invalidate(&self) {
        self.chain_id.write().take();
    }

    pub fn chain_id(&self) -> Result<ChainId, ChainResolverError> {
        (*self.chain_id.read()).ok_or(ChainResolverError::Unresolved)
    }

    pub fn is_mainchain(&self) -> Result<bool, ChainResolverError> {
        Ok(self.chain_id()?.is_mainchain())
    }
}

/// Finds channel metadata locally or through the mainchain's service.
pub struct ChannelResolver {
    context: Arc<ChainContext>,
    local: Arc<dyn ChannelSource>,
    mainchain: Arc<dyn ChannelSource>,
}

impl ChannelResolver {
    pub fn new(
        context: Arc<ChainContext>,
        local: Arc<dyn ChannelSource>,
        mainchain: Arc<dyn ChannelSource>,
    ) -> Self {
        Self {
            context,
            local,
            mainchain,
        }
    }

    pub fn is_mainchain(&self) -> Result<bool, ChainResolverError> {
        self.context.is_mainchain()
    }

    /// Channel between the local chain and `target`. Failures are returned
    /// as-is, without retry.
    pub async fn resolve_channel(
        &self,
        target: &ChainId,
    ) -> Result<ResolvedChannel, ChainResolverError> {
        let current = self.context.chain_id()?;
        let route = route(&current, target)?;
        debug!(chain_id = %current, target = %target, route = route.as_str(), "Resolving channel");

        let channel = match route {
            ChannelRoute::Local => self.local.get_channel(target).await?,
            ChannelRoute::Delegated => self.mainchain.get_channel(target).await?,
        };
        Ok(ResolvedChannel { route, channel })
    }
}
