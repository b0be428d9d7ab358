//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Node notifications and indexing outcomes are choreographed over a single
//! in-process broadcast bus instead of direct calls between workers.
//!
//! ```text
//! ┌──────────────┐  BlockAccepted   ┌──────────────┐  BlockIndexed  ┌──────────────┐
//! │ Node adapter │ ───────────────▶ │ Block worker │ ─────────────▶ │ Pending      │
//! └──────────────┘                  └──────────────┘                │ refresher    │
//!        │      PendingTransactionReceived                          └──────────────┘
//!        └─────────────────────────────────────────────────────────────────▲
//! ```
//!
//! Subscribers that fall behind lose the oldest events. Consumers that need
//! completeness (the block worker) treat events as triggers and re-read the
//! authoritative state from the node.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{
    EventFilter, EventTopic, HaltNotice, IndexerEvent, SOURCE_BLOCK_INDEXING, SOURCE_NODE,
    SOURCE_PENDING,
};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
