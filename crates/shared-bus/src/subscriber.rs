//! # Event Subscriber
//!
//! A subscription receives every bus event and skips those its filter
//! rejects. Falling more than the bus capacity behind loses the oldest
//! events; consumers that must not miss blocks treat events as triggers and
//! re-read state instead.

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::events::{EventFilter, EventTopic, IndexerEvent};
use crate::publisher::TopicCounts;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

/// Filtered receiving end of the bus. Unregisters itself on drop.
pub struct Subscription {
    receiver: broadcast::Receiver<IndexerEvent>,
    filter: EventFilter,
    topics: Vec<EventTopic>,
    counts: TopicCounts,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<IndexerEvent>,
        filter: EventFilter,
        topics: Vec<EventTopic>,
        counts: TopicCounts,
    ) -> Self {
        Self {
            receiver,
            filter,
            topics,
            counts,
            lagged: 0,
        }
    }

    /// Next matching event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<IndexerEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.lagged += count;
                    warn!(
                        lagged = count,
                        topics = ?self.topics,
                        "Subscriber lagged, events dropped"
                    );
                    continue;
                }
            };
            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Result<Option<IndexerEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(event) => event,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.lagged += count;
                    continue;
                }
            };
            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Events this subscription lost by falling behind.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut counts = self.counts.lock();
        for topic in &self.topics {
            if let Some(count) = counts.get_mut(topic) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(topic);
                }
            }
        }
        debug!(topics = ?self.topics, lagged = self.lagged, "Subscription closed");
    }
}
