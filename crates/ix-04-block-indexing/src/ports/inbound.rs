//! # Inbound Ports

use ix_02_index_store::StoreError;
use shared_types::Block;

use crate::domain::IndexingError;

/// Result of `index_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Committed. `skipped` transactions failed on chain and were not applied.
    Indexed { applied: usize, skipped: usize },
    /// The same block was already indexed; nothing changed.
    AlreadyIndexed,
}

/// Result of `revert_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    Reverted { reverted: usize },
    /// That block is not the one indexed at its height; nothing changed.
    NotIndexed,
}

/// Block-level operations on the index tables.
pub trait BlockIndexingApi: Send + Sync {
    fn index_block(&self, block: &Block) -> Result<IndexOutcome, IndexingError>;

    fn revert_block(&self, block: &Block) -> Result<RevertOutcome, IndexingError>;

    fn indexed_block(&self, height: u64) -> Result<Option<Block>, StoreError>;

    fn last_indexed_height(&self) -> Result<Option<u64>, StoreError>;
}
