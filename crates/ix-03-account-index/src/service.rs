//! # Account Index Service
//!
//! Identity writes are committed on their own, outside any block's unit of
//! work. A failed write is parked in the durable retry queue instead of
//! being surfaced to the caller.

use std::sync::Arc;

use ix_02_index_store::{
    IndexReader, IndexWriter, KeyValueStore, RetryEntry, StoreError, UnitOfWork,
};
use shared_types::{AccountPatch, AccountRecord, Address, Page, PublicKey, ValidatorRecord};
use tracing::{debug, error, info, warn};

use crate::domain::{
    AccountFilter, AccountIndexError, DrainReport, ResolveOutcome, ValidatorFilter, ValidatorSort,
};
use crate::ports::{AccountIndexApi, TimeSource};

pub struct AccountIndex {
    store: Arc<dyn KeyValueStore>,
    time: Arc<dyn TimeSource>,
}

impl AccountIndex {
    pub fn new(store: Arc<dyn KeyValueStore>, time: Arc<dyn TimeSource>) -> Self {
        Self { store, time }
    }

    /// Write the public key and drop any queued retry for it in one batch.
    fn index_public_key(&self, public_key: &PublicKey) -> Result<ResolveOutcome, StoreError> {
        let address = public_key.address();
        let store = self.store.as_ref();

        let existing = store.account(&address)?;
        if existing.and_then(|a| a.public_key).as_ref() == Some(public_key) {
            if store.retry_entry(public_key)?.is_some() {
                let mut uow = UnitOfWork::begin(store);
                uow.delete_retry(public_key)?;
                uow.commit()?;
            }
            return Ok(ResolveOutcome::AlreadyIndexed(address));
        }

        let mut uow = UnitOfWork::begin(store);
        uow.apply_account_patch(&address, &AccountPatch::new().public_key(*public_key))?;
        uow.delete_retry(public_key)?;
        uow.commit()?;
        Ok(ResolveOutcome::Indexed(address))
    }

    fn enqueue(&self, public_key: &PublicKey) -> Result<RetryEntry, StoreError> {
        let store = self.store.as_ref();
        let entry = match store.retry_entry(public_key)? {
            Some(mut entry) => {
                entry.attempts += 1;
                entry
            }
            None => RetryEntry {
                public_key: *public_key,
                enqueued_at: self.time.now(),
                attempts: 1,
            },
        };
        let mut uow = UnitOfWork::begin(store);
        uow.put_retry(&entry)?;
        uow.commit()?;
        Ok(entry)
    }
}

impl AccountIndexApi for AccountIndex {
    fn upsert_account_field(
        &self,
        address: &Address,
        patch: &AccountPatch,
    ) -> Result<(), AccountIndexError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut uow = UnitOfWork::begin(self.store.as_ref());
        uow.apply_account_patch(address, patch)?;
        uow.commit()?;
        debug!(
            address = %address,
            fields = patch.set.len() + patch.clear.len(),
            "Account upserted"
        );
        Ok(())
    }

    fn resolve_and_upsert_by_public_key(&self, public_key: &PublicKey) -> ResolveOutcome {
        match self.index_public_key(public_key) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    public_key = %public_key,
                    error = %e,
                    "Account update failed, queued for retry"
                );
                match self.enqueue(public_key) {
                    Ok(_) => ResolveOutcome::Queued,
                    Err(queue_err) => {
                        error!(
                            public_key = %public_key,
                            error = %queue_err,
                            "Failed to queue account update"
                        );
                        ResolveOutcome::Dropped
                    }
                }
            }
        }
    }

    fn drain_retry_queue(&self) -> Result<DrainReport, AccountIndexError> {
        let entries = self.store.retry_entries()?;
        let mut report = DrainReport {
            attempted: entries.len(),
            ..DrainReport::default()
        };

        for entry in entries {
            match self.index_public_key(&entry.public_key) {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    debug!(
                        public_key = %entry.public_key,
                        attempts = entry.attempts,
                        error = %e,
                        "Retry failed"
                    );
                    if let Err(e) = self.enqueue(&entry.public_key) {
                        warn!(
                            public_key = %entry.public_key,
                            error = %e,
                            "Failed to bump retry attempts"
                        );
                    }
                }
            }
        }

        report.remaining = self.store.retry_entries()?.len();
        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                remaining = report.remaining,
                "Retry queue drained"
            );
        }
        Ok(report)
    }

    fn retry_queue_depth(&self) -> Result<usize, AccountIndexError> {
        Ok(self.store.retry_entries()?.len())
    }

    fn query_accounts(
        &self,
        filter: &AccountFilter,
    ) -> Result<Vec<AccountRecord>, AccountIndexError> {
        filter.validate()?;
        let store = self.store.as_ref();

        let derived = filter.public_key.as_ref().map(PublicKey::address);
        let candidates = match filter.address.or(derived) {
            Some(address) => store.account(&address)?.into_iter().collect(),
            None => store.accounts()?,
        };

        Ok(candidates
            .into_iter()
            .filter(|a| filter.address.map_or(true, |addr| a.address == addr))
            .filter(|a| derived.map_or(true, |addr| a.address == addr))
            .filter(|a| {
                filter
                    .name
                    .as_deref()
                    .map_or(true, |name| a.name.as_deref() == Some(name))
            })
            .collect())
    }

    fn query_validators(
        &self,
        filter: &ValidatorFilter,
    ) -> Result<Page<ValidatorRecord>, AccountIndexError> {
        filter.validate()?;

        let mut validators: Vec<ValidatorRecord> = match filter.address {
            Some(address) => self.store.validator(&address)?.into_iter().collect(),
            None => self.store.validators()?,
        };
        if let Some(name) = filter.name.as_deref() {
            validators.retain(|v| v.name == name);
        }
        validators.sort_by(|a, b| a.name.cmp(&b.name).then(a.address.cmp(&b.address)));
        if filter.sort == ValidatorSort::NameDesc {
            validators.reverse();
        }

        Ok(filter.page.apply(validators))
    }
}
