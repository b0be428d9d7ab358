//! # Pending Transaction Mirror
//!
//! Readers clone the current `Arc<PendingSnapshot>` and work on it without
//! holding the lock; a refresh builds a complete new snapshot and swaps the
//! pointer.

use std::sync::Arc;
use std::time::Duration;

use ix_06_chain_resolver::ChainContext;
use parking_lot::RwLock;
use shared_types::Page;
use tracing::{debug, warn};

use crate::domain::{PendingError, PendingQuery, PendingTransaction};
use crate::ports::{SenderDirectory, TransactionPoolSource};

/// An immutable copy of the pool.
#[derive(Debug, Default)]
pub struct PendingSnapshot {
    pub transactions: Vec<PendingTransaction>,
    /// Incremented on every successful refresh.
    pub generation: u64,
}

/// Result of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { size: usize },
    /// The pool could not be read; `kept` transactions are still served.
    Degraded { error: PendingError, kept: usize },
}

pub struct PendingTransactionMirror {
    source: Arc<dyn TransactionPoolSource>,
    directory: Arc<dyn SenderDirectory>,
    context: Arc<ChainContext>,
    timeout: Duration,
    snapshot: RwLock<Arc<PendingSnapshot>>,
}

impl PendingTransactionMirror {
    pub fn new(
        source: Arc<dyn TransactionPoolSource>,
        directory: Arc<dyn SenderDirectory>,
        context: Arc<ChainContext>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            directory,
            context,
            timeout,
            snapshot: RwLock::new(Arc::new(PendingSnapshot::default())),
        }
    }

    pub fn snapshot(&self) -> Arc<PendingSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the mirror from the node's pool.
    pub async fn refresh(&self) -> RefreshOutcome {
        let fetched = match tokio::time::timeout(self.timeout, self.source.pool_transactions())
            .await
        {
            Ok(Ok(transactions)) => transactions,
            Ok(Err(error)) => return self.degraded(error),
            Err(_) => return self.degraded(PendingError::Timeout(self.timeout.as_millis() as u64)),
        };

        let transactions: Vec<PendingTransaction> = fetched
            .into_iter()
            .map(|tx| {
                let name = self.directory.name_of(&tx.sender_address());
                PendingTransaction::from_pool(tx, name)
            })
            .collect();
        let size = transactions.len();

        let mut current = self.snapshot.write();
        let generation = current.generation + 1;
        *current = Arc::new(PendingSnapshot {
            transactions,
            generation,
        });
        drop(current);

        debug!(size, generation, "Pending snapshot refreshed");
        RefreshOutcome::Refreshed { size }
    }

    fn degraded(&self, error: PendingError) -> RefreshOutcome {
        let kept = self.len();
        warn!(error = %error, kept, "Pending refresh failed, keeping previous snapshot");
        RefreshOutcome::Degraded { error, kept }
    }

    /// Filter, sort and page the current snapshot.
    pub fn query(&self, query: &PendingQuery) -> Result<Page<PendingTransaction>, PendingError> {
        query.validate()?;
        let snapshot = self.snapshot();
        let current_chain = self.context.chain_id().ok();

        let mut matched: Vec<PendingTransaction> = snapshot
            .transactions
            .iter()
            .filter(|tx| query.filter.matches(tx, current_chain.as_ref()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| query.sort.compare(a, b));

        Ok(query.page.apply(matched))
    }
}
