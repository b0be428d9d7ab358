//! # Event Publisher
//!
//! The bus fans every event out to all subscriptions over one broadcast
//! channel; each subscription filters on its own side. The first
//! `IndexingHalted` event is also latched so that tasks which were not
//! listening at the time can still observe the halt.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, trace};

use crate::events::{EventFilter, EventTopic, HaltNotice, IndexerEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Live subscription count per requested topic.
pub(crate) type TopicCounts = Arc<Mutex<HashMap<EventTopic, usize>>>;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns how many subscriptions were live to see it.
    async fn publish(&self, event: IndexerEvent) -> usize;

    /// Total events published so far.
    fn events_published(&self) -> u64;
}

pub struct InMemoryEventBus {
    sender: broadcast::Sender<IndexerEvent>,
    topics: TopicCounts,
    published: AtomicU64,
    halt: watch::Sender<Option<HaltNotice>>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` bounds how far a subscription may fall behind before it
    /// starts losing events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (halt, _) = watch::channel(None);
        Self {
            sender,
            topics: Arc::new(Mutex::new(HashMap::new())),
            published: AtomicU64::new(0),
            halt,
            capacity,
        }
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topics = requested_topics(&filter);
        {
            let mut counts = self.topics.lock();
            for topic in &topics {
                *counts.entry(*topic).or_insert(0) += 1;
            }
        }
        debug!(topics = ?topics, "Subscription opened");
        Subscription::new(receiver, filter, topics, self.topics.clone())
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Subscriptions that asked for `topic` explicitly or for everything.
    #[must_use]
    pub fn subscribers_on(&self, topic: EventTopic) -> usize {
        let counts = self.topics.lock();
        let explicit = if topic == EventTopic::All {
            0
        } else {
            counts.get(&topic).copied().unwrap_or(0)
        };
        explicit + counts.get(&EventTopic::All).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The first halt published on this bus, if any.
    #[must_use]
    pub fn halted(&self) -> Option<HaltNotice> {
        self.halt.borrow().clone()
    }

    /// Watch for the halt latch. The current value is `None` until indexing halts.
    #[must_use]
    pub fn watch_halt(&self) -> watch::Receiver<Option<HaltNotice>> {
        self.halt.subscribe()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Topics a filter is counted under. Unfiltered subscriptions count as `All`.
fn requested_topics(filter: &EventFilter) -> Vec<EventTopic> {
    if filter.topics.is_empty() || filter.topics.contains(&EventTopic::All) {
        vec![EventTopic::All]
    } else {
        let mut topics = filter.topics.clone();
        topics.sort_by_key(|t| *t as u8);
        topics.dedup();
        topics
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: IndexerEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();

        if let Some(notice) = event.halt_notice() {
            let latched = self.halt.send_if_modified(|current| {
                if current.is_some() {
                    return false;
                }
                *current = Some(notice.clone());
                true
            });
            if latched {
                error!(block_height = notice.height, block_id = %notice.id, "Halt latched on bus");
            }
        }

        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(topic = ?topic, receivers, "Event published");
                receivers
            }
            Err(_) => {
                debug!(topic = ?topic, "Event published with no subscriptions");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
