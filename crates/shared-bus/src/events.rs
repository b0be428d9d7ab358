//! # Indexer Events
//!
//! Every event that flows through the shared bus. Node notifications enter
//! through the runtime's subscription adapter; the indexing subsystems
//! publish their outcomes so downstream workers can react.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, TransactionId};

/// Source identifier for events relayed from the node subscription.
pub const SOURCE_NODE: u8 = 0;
/// Source identifier of the block indexing engine.
pub const SOURCE_BLOCK_INDEXING: u8 = 4;
/// Source identifier of the pending-transaction mirror.
pub const SOURCE_PENDING: u8 = 5;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexerEvent {
    // =========================================================================
    // NODE NOTIFICATIONS
    // =========================================================================
    /// The node accepted a new block at the tip.
    BlockAccepted { height: u64, id: BlockId },

    /// The node removed a block from its chain (reorg).
    BlockDeleted { height: u64, id: BlockId },

    /// A transaction entered the node's unconfirmed pool.
    PendingTransactionReceived { id: TransactionId },

    // =========================================================================
    // BLOCK INDEXING
    // =========================================================================
    /// A block's effects were committed to the index tables.
    BlockIndexed {
        height: u64,
        id: BlockId,
        transactions: usize,
    },

    /// A block's effects were undone.
    BlockReverted { height: u64, id: BlockId },

    /// Indexing stopped on a fatal error and needs operator attention.
    IndexingHalted {
        height: u64,
        id: BlockId,
        reason: String,
    },

    // =========================================================================
    // PENDING POOL
    // =========================================================================
    /// A new pending-pool snapshot was published.
    PendingSnapshotRefreshed { size: usize },

    /// A refresh failed; the previous snapshot is still served.
    PendingRefreshFailed { reason: String },
}

impl IndexerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockAccepted { .. }
            | Self::BlockDeleted { .. }
            | Self::PendingTransactionReceived { .. } => EventTopic::Node,
            Self::BlockIndexed { .. } | Self::BlockReverted { .. } => EventTopic::Indexing,
            Self::IndexingHalted { .. } => EventTopic::Halt,
            Self::PendingSnapshotRefreshed { .. } | Self::PendingRefreshFailed { .. } => {
                EventTopic::PendingPool
            }
        }
    }

    /// Get the originating source ID.
    #[must_use]
    pub fn source(&self) -> u8 {
        match self {
            Self::BlockAccepted { .. }
            | Self::BlockDeleted { .. }
            | Self::PendingTransactionReceived { .. } => SOURCE_NODE,
            Self::BlockIndexed { .. }
            | Self::BlockReverted { .. }
            | Self::IndexingHalted { .. } => SOURCE_BLOCK_INDEXING,
            Self::PendingSnapshotRefreshed { .. } | Self::PendingRefreshFailed { .. } => {
                SOURCE_PENDING
            }
        }
    }

    /// The halt this event reports, if it is one.
    #[must_use]
    pub fn halt_notice(&self) -> Option<HaltNotice> {
        match self {
            Self::IndexingHalted { height, id, reason } => Some(HaltNotice {
                height: *height,
                id: *id,
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Where and why indexing stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltNotice {
    pub height: u64,
    pub id: BlockId,
    pub reason: String,
}

impl fmt::Display for HaltNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "indexing halted at block {} ({}): {}", self.height, self.id, self.reason)
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Notifications relayed from the node.
    Node,
    /// Index table changes.
    Indexing,
    /// Fatal indexing stops.
    Halt,
    /// Pending-pool mirror updates.
    PendingPool,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Sources to include. Empty means all sources.
    pub sources: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            sources: Vec::new(),
        }
    }

    /// Create a filter for events from specific sources.
    #[must_use]
    pub fn from_sources(sources: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            sources,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &IndexerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.sources.is_empty() || self.sources.contains(&event.source());

        topic_match && source_match
    }
}
