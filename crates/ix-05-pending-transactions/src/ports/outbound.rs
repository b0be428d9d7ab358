//! # Outbound Ports

use async_trait::async_trait;
use ix_03_account_index::{AccountFilter, AccountIndexApi};
use shared_types::{Address, Transaction};
use tracing::debug;

use crate::domain::PendingError;

/// The node's unconfirmed transaction pool.
#[async_trait]
pub trait TransactionPoolSource: Send + Sync {
    async fn pool_transactions(&self) -> Result<Vec<Transaction>, PendingError>;
}

/// Best-effort sender name lookup.
pub trait SenderDirectory: Send + Sync {
    fn name_of(&self, address: &Address) -> Option<String>;
}

impl<T: AccountIndexApi + ?Sized> SenderDirectory for T {
    fn name_of(&self, address: &Address) -> Option<String> {
        match self.query_accounts(&AccountFilter::by_address(*address)) {
            Ok(accounts) => accounts.into_iter().next().and_then(|a| a.name),
            Err(e) => {
                debug!(address = %address, error = %e, "Sender name lookup failed");
                None
            }
        }
    }
}
