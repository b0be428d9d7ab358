//! Error types for processors and the indexing engine.

use ix_01_reward_splitter::RewardError;
use ix_02_index_store::StoreError;
use shared_types::{Address, BlockId, TransactionId};
use thiserror::Error;

/// Failure inside one command processor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// No processor is registered for the command.
    #[error("Unknown command {module}:{command}")]
    UnknownCommand { module: String, command: String },

    /// The transaction params do not match the command's shape.
    #[error("Invalid params for {command}: {reason}")]
    InvalidParams { command: String, reason: String },

    /// A record the command depends on does not exist.
    #[error("Missing {kind} for {address}")]
    MissingRecord { kind: &'static str, address: Address },

    /// A record the command creates already exists.
    #[error("{kind} already exists for {address}")]
    AlreadyExists { kind: &'static str, address: Address },

    /// A stake delta would drive the balance below zero.
    #[error("Stake of {staker} on {validator} would become negative")]
    StakeUnderflow { staker: Address, validator: Address },

    /// A running total overflowed or went negative.
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Reward error: {0}")]
    Reward(#[from] RewardError),
}

/// Failure of a whole block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexingError {
    /// The block carries a command nothing can process.
    #[error("Block {height} ({id}): unknown command {module}:{command}")]
    UnknownCommand {
        height: u64,
        id: BlockId,
        module: String,
        command: String,
    },

    /// A processor failed; the unit of work was discarded.
    #[error("Block {height} ({id}): transaction {transaction} failed: {source}")]
    Processor {
        height: u64,
        id: BlockId,
        transaction: TransactionId,
        source: ProcessorError,
    },

    /// Block reward accounting failed.
    #[error("Block {height} ({id}): reward accounting failed: {source}")]
    Reward {
        height: u64,
        id: BlockId,
        source: ProcessorError,
    },

    /// A different block is already indexed at this height.
    #[error("Block {height}: {indexed} already indexed, refusing {incoming}")]
    HeightConflict {
        height: u64,
        indexed: BlockId,
        incoming: BlockId,
    },

    /// Only the highest indexed block may be reverted.
    #[error("Block {height} ({id}) is below the indexed tip {tip}")]
    NotTip { height: u64, id: BlockId, tip: u64 },

    /// The store failed outside any processor.
    #[error("Block {height} ({id}): storage error: {source}")]
    Store {
        height: u64,
        id: BlockId,
        source: StoreError,
    },
}

impl IndexingError {
    /// Whether indexing must stop for operator attention.
    ///
    /// Store failures may be transient; everything else repeats identically
    /// on every attempt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IndexingError::Store { .. })
    }

    pub fn height(&self) -> u64 {
        match self {
            IndexingError::UnknownCommand { height, .. }
            | IndexingError::Processor { height, .. }
            | IndexingError::Reward { height, .. }
            | IndexingError::HeightConflict { height, .. }
            | IndexingError::NotTip { height, .. }
            | IndexingError::Store { height, .. } => *height,
        }
    }

    /// The block being indexed or reverted when the error occurred.
    pub fn block_id(&self) -> BlockId {
        match self {
            IndexingError::UnknownCommand { id, .. }
            | IndexingError::Processor { id, .. }
            | IndexingError::Reward { id, .. }
            | IndexingError::NotTip { id, .. }
            | IndexingError::Store { id, .. } => *id,
            IndexingError::HeightConflict { incoming, .. } => *incoming,
        }
    }
}
