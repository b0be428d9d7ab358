//! # Block Synchronizer
//!
//! The only task that drives the indexing engine. Node events are triggers:
//! every trigger re-reads the last indexed height and walks forward to the
//! announced height, so lagged or dropped events never skip a block.
//!
//! Reorgs surface two ways. A fetched block whose `previousBlockID` differs
//! from the stored parent unwinds the stored tip until the chains agree; a
//! `BlockDeleted` event unwinds every indexed block from the deleted height
//! up.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexer_telemetry::{log_block_event, time_histogram, BLOCK_INDEX_DURATION};
use ix_02_index_store::StoreError;
use ix_04_block_indexing::{BlockIndexingApi, IndexOutcome, IndexingError, RevertOutcome};
use shared_bus::{EventPublisher, IndexerEvent, Subscription};
use shared_types::{Block, BlockId};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::adapters::NodeRpcError;

/// Where blocks come from.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Height of the node's current tip.
    async fn tip_height(&self) -> Result<u64, NodeRpcError>;

    /// The canonical block at `height`, with its event log.
    async fn block_at(&self, height: u64) -> Result<Block, NodeRpcError>;
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Block {height} unavailable after {attempts} attempts: {source}")]
    Fetch {
        height: u64,
        attempts: u32,
        source: NodeRpcError,
    },

    #[error("Node tip unavailable: {0}")]
    Tip(NodeRpcError),

    #[error(transparent)]
    Indexing(#[from] IndexingError),

    #[error("Index store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Fatal errors stop the synchronizer; the rest wait for the next trigger.
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Fetch { .. } => true,
            SyncError::Indexing(e) => e.is_fatal(),
            SyncError::Tip(_) | SyncError::Store(_) => false,
        }
    }

    fn location(&self) -> (u64, BlockId) {
        match self {
            SyncError::Fetch { height, .. } => (*height, BlockId::default()),
            SyncError::Indexing(e) => (e.height(), e.block_id()),
            SyncError::Tip(_) | SyncError::Store(_) => (0, BlockId::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// First height indexed on an empty database.
    pub start_height: u64,
    /// Fetch attempts per block before halting.
    pub fetch_retries: u32,
    pub fetch_backoff: Duration,
    /// Tip poll when the node sends no events.
    pub poll_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            start_height: 0,
            fetch_retries: 3,
            fetch_backoff: Duration::from_millis(500),
            poll_interval: Duration::from_secs(10),
        }
    }
}

pub struct BlockSynchronizer {
    source: Arc<dyn BlockSource>,
    engine: Arc<dyn BlockIndexingApi>,
    publisher: Arc<dyn EventPublisher>,
    settings: SyncSettings,
}

impl BlockSynchronizer {
    pub fn new(
        source: Arc<dyn BlockSource>,
        engine: Arc<dyn BlockIndexingApi>,
        publisher: Arc<dyn EventPublisher>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            source,
            engine,
            publisher,
            settings,
        }
    }

    /// Run until shutdown or a fatal error. `events` should carry node events.
    pub async fn run(self, mut events: Subscription, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut events_open = true;
        info!(
            start_height = self.settings.start_height,
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            "Block synchronizer started"
        );

        loop {
            let step = tokio::select! {
                _ = ticker.tick() => self.sync_to_tip().await,
                event = events.recv(), if events_open => match event {
                    Some(IndexerEvent::BlockAccepted { height, .. }) => self.catch_up(height).await,
                    Some(IndexerEvent::BlockDeleted { height, id }) => {
                        self.handle_deleted(height, id).await
                    }
                    Some(_) => Ok(()),
                    None => {
                        debug!("Node event channel closed, polling only");
                        events_open = false;
                        Ok(())
                    }
                },
                _ = shutdown.changed() => {
                    info!("Block synchronizer shutting down");
                    break;
                }
            };

            if let Err(error) = step {
                if error.is_fatal() {
                    self.halt(&error).await;
                    break;
                }
                warn!(error = %error, "Sync step failed, retrying on next trigger");
            }
        }
    }

    async fn sync_to_tip(&self) -> Result<(), SyncError> {
        let tip = self.source.tip_height().await.map_err(SyncError::Tip)?;
        self.catch_up(tip).await
    }

    /// Index forward until `target` is indexed, unwinding forks on the way.
    pub async fn catch_up(&self, target: u64) -> Result<(), SyncError> {
        loop {
            let next = match self.engine.last_indexed_height()? {
                Some(height) => height + 1,
                None => self.settings.start_height,
            };
            if next > target {
                return Ok(());
            }

            let block = self.fetch(next).await?;
            if let Some(parent) = self.parent_of(next)? {
                if parent.id() != block.header.previous_block_id {
                    info!(
                        block_height = parent.height(),
                        stored = %parent.id(),
                        expected = %block.header.previous_block_id,
                        "Fork detected, unwinding"
                    );
                    self.revert(&parent).await?;
                    continue;
                }
            }
            self.index(&block).await?;
        }
    }

    /// Unwind every indexed block from `height` up, if `id` is what we indexed there.
    pub async fn handle_deleted(&self, height: u64, id: BlockId) -> Result<(), SyncError> {
        let Some(last) = self.engine.last_indexed_height()? else {
            return Ok(());
        };
        match self.engine.indexed_block(height)? {
            Some(stored) if stored.id() == id => {}
            _ => {
                debug!(block_height = height, block_id = %id, "Deleted block was not indexed");
                return Ok(());
            }
        }
        for h in (height..=last).rev() {
            if let Some(block) = self.engine.indexed_block(h)? {
                self.revert(&block).await?;
            }
        }
        Ok(())
    }

    fn parent_of(&self, height: u64) -> Result<Option<Block>, StoreError> {
        if height <= self.settings.start_height {
            return Ok(None);
        }
        self.engine.indexed_block(height - 1)
    }

    async fn fetch(&self, height: u64) -> Result<Block, SyncError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.source.block_at(height).await {
                Ok(block) => return Ok(block),
                Err(source) if attempts >= self.settings.fetch_retries => {
                    return Err(SyncError::Fetch {
                        height,
                        attempts,
                        source,
                    });
                }
                Err(e) => {
                    warn!(
                        block_height = height,
                        attempt = attempts,
                        error = %e,
                        "Block fetch failed"
                    );
                    tokio::time::sleep(self.settings.fetch_backoff).await;
                }
            }
        }
    }

    async fn index(&self, block: &Block) -> Result<(), SyncError> {
        let outcome = {
            let _timer = time_histogram!(BLOCK_INDEX_DURATION);
            self.engine.index_block(block)?
        };
        match outcome {
            IndexOutcome::Indexed { applied, skipped } => {
                log_block_event!(
                    info,
                    "sync",
                    "Block indexed",
                    block.height(),
                    block.id(),
                    applied = applied,
                    skipped = skipped
                );
                self.publisher
                    .publish(IndexerEvent::BlockIndexed {
                        height: block.height(),
                        id: block.id(),
                        transactions: block.transactions.len(),
                    })
                    .await;
            }
            IndexOutcome::AlreadyIndexed => {
                debug!(block_height = block.height(), "Block already indexed");
            }
        }
        Ok(())
    }

    async fn revert(&self, block: &Block) -> Result<(), SyncError> {
        if let RevertOutcome::Reverted { reverted } = self.engine.revert_block(block)? {
            log_block_event!(
                info,
                "sync",
                "Block reverted",
                block.height(),
                block.id(),
                reverted = reverted
            );
            self.publisher
                .publish(IndexerEvent::BlockReverted {
                    height: block.height(),
                    id: block.id(),
                })
                .await;
        }
        Ok(())
    }

    async fn halt(&self, error: &SyncError) {
        let (height, id) = error.location();
        error!(
            block_height = height,
            block_id = %id,
            error = %error,
            "Indexing halted, operator attention required"
        );
        self.publisher
            .publish(IndexerEvent::IndexingHalted {
                height,
                id,
                reason: error.to_string(),
            })
            .await;
    }
}
