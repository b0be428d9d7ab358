//! # Inbound Ports

use shared_types::{AccountPatch, AccountRecord, Address, Page, PublicKey, ValidatorRecord};

use crate::domain::{
    AccountFilter, AccountIndexError, DrainReport, ResolveOutcome, ValidatorFilter,
};

/// Account and validator index operations.
pub trait AccountIndexApi: Send + Sync {
    /// Apply a partial update to one account, committed on its own.
    fn upsert_account_field(
        &self,
        address: &Address,
        patch: &AccountPatch,
    ) -> Result<(), AccountIndexError>;

    /// Record the public key on the account it derives. Failures are queued
    /// for retry and never reported to the caller as errors.
    fn resolve_and_upsert_by_public_key(&self, public_key: &PublicKey) -> ResolveOutcome;

    /// Re-attempt every queued public key once.
    fn drain_retry_queue(&self) -> Result<DrainReport, AccountIndexError>;

    fn retry_queue_depth(&self) -> Result<usize, AccountIndexError>;

    fn query_accounts(&self, filter: &AccountFilter)
        -> Result<Vec<AccountRecord>, AccountIndexError>;

    fn query_validators(
        &self,
        filter: &ValidatorFilter,
    ) -> Result<Page<ValidatorRecord>, AccountIndexError>;
}
