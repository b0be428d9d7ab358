//! # Typed Tables
//!
//! [`IndexReader`] and [`IndexWriter`] give every table a typed API over any
//! raw reader or writer: a store handle for plain reads, a [`UnitOfWork`]
//! for the writes of one block.

use ix_01_reward_splitter::{CommissionHistory, RewardError, StakeLedger};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    AccountFieldValue, AccountPatch, AccountRecord, Address, Block, CommissionEntry, PublicKey,
    StakeRecord, SubscriptionRecord, ValidatorRecord,
};

use crate::domain::keys;
use crate::domain::{RetryEntry, StoreError};
use crate::ports::{InMemoryKVStore, KeyValueStore};
use crate::unit_of_work::UnitOfWork;

/// Raw ordered reads.
pub trait KvRead {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn last_entry_below(
        &self,
        prefix: &[u8],
        upper: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// Raw buffered writes.
pub trait KvWrite {
    fn write(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;

    fn remove(&mut self, key: Vec<u8>) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KvRead for S {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.get(key)
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.prefix_scan(prefix)
    }

    fn last_entry_below(
        &self,
        prefix: &[u8],
        upper: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.last_below(prefix, upper)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Typed reads over every table.
pub trait IndexReader: KvRead {
    /// Account row, or `None` when no field of it is stored.
    fn account(&self, address: &Address) -> Result<Option<AccountRecord>, StoreError> {
        let rows = self.scan(&keys::account_prefix(address))?;
        if rows.is_empty() {
            return Ok(None);
        }
        let mut record = AccountRecord::empty(*address);
        for (_, value) in rows {
            record.apply(decode::<AccountFieldValue>(&value)?);
        }
        Ok(Some(record))
    }

    /// Every account row, ordered by address.
    fn accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let mut out: Vec<AccountRecord> = Vec::new();
        for (key, value) in self.scan(keys::ACCOUNT)? {
            let (address, _) = keys::parse_account_field(&key)?;
            if out.last().map(|r| r.address) != Some(address) {
                out.push(AccountRecord::empty(address));
            }
            if let Some(record) = out.last_mut() {
                record.apply(decode::<AccountFieldValue>(&value)?);
            }
        }
        Ok(out)
    }

    fn validator(&self, address: &Address) -> Result<Option<ValidatorRecord>, StoreError> {
        self.read(&keys::validator(address))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn validators(&self) -> Result<Vec<ValidatorRecord>, StoreError> {
        self.scan(keys::VALIDATOR)?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }

    fn commission_at(&self, address: &Address, height: u64) -> Result<Option<u16>, StoreError> {
        self.read(&keys::commission(address, height))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Most recent commission entry strictly below `height`.
    fn latest_commission_below(
        &self,
        address: &Address,
        height: u64,
    ) -> Result<Option<CommissionEntry>, StoreError> {
        let prefix = keys::commission_prefix(address);
        let upper = keys::commission(address, height);
        match self.last_entry_below(&prefix, &upper)? {
            Some((key, value)) => {
                let (address, height) = keys::parse_commission(&key)?;
                Ok(Some(CommissionEntry {
                    address,
                    height,
                    commission: decode(&value)?,
                }))
            }
            None => Ok(None),
        }
    }

    fn commission_history(&self, address: &Address) -> Result<Vec<CommissionEntry>, StoreError> {
        self.scan(&keys::commission_prefix(address))?
            .into_iter()
            .map(|(key, value)| {
                let (address, height) = keys::parse_commission(&key)?;
                Ok(CommissionEntry {
                    address,
                    height,
                    commission: decode(&value)?,
                })
            })
            .collect()
    }

    fn stake(
        &self,
        staker: &Address,
        validator: &Address,
    ) -> Result<Option<StakeRecord>, StoreError> {
        match self.read(&keys::stake(staker, validator))? {
            Some(bytes) => Ok(Some(StakeRecord {
                staker: *staker,
                validator: *validator,
                amount: decode(&bytes)?,
            })),
            None => Ok(None),
        }
    }

    /// Every stake placed on `validator`.
    fn stakes_on(&self, validator: &Address) -> Result<Vec<StakeRecord>, StoreError> {
        self.scan(&keys::stake_prefix(validator))?
            .into_iter()
            .map(|(key, value)| {
                let (staker, validator) = keys::parse_stake(&key)?;
                Ok(StakeRecord {
                    staker,
                    validator,
                    amount: decode(&value)?,
                })
            })
            .collect()
    }

    fn subscription(&self, address: &Address) -> Result<Option<SubscriptionRecord>, StoreError> {
        self.read(&keys::subscription(address))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn retry_entry(&self, public_key: &PublicKey) -> Result<Option<RetryEntry>, StoreError> {
        self.read(&keys::retry(public_key))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn retry_entries(&self) -> Result<Vec<RetryEntry>, StoreError> {
        self.scan(keys::RETRY)?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }

    /// The block indexed at `height`, if any.
    fn indexed_block(&self, height: u64) -> Result<Option<Block>, StoreError> {
        match self.read(&keys::block(height))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn last_indexed_height(&self) -> Result<Option<u64>, StoreError> {
        let upper = keys::prefix_end(keys::BLOCK);
        match self.last_entry_below(keys::BLOCK, &upper)? {
            Some((key, _)) => Ok(Some(keys::parse_block(&key)?)),
            None => Ok(None),
        }
    }
}

impl<T: KvRead + ?Sized> IndexReader for T {}

/// Typed writes over every table.
pub trait IndexWriter: KvWrite + IndexReader {
    /// Set and clear individual account fields. `isValidator = false` is
    /// stored as absence so a row holding nothing else disappears.
    fn apply_account_patch(
        &mut self,
        address: &Address,
        patch: &AccountPatch,
    ) -> Result<(), StoreError> {
        for value in &patch.set {
            let key = keys::account_field(address, value.field());
            match value {
                AccountFieldValue::IsValidator(false) => self.remove(key)?,
                _ => self.write(key, encode(value)?)?,
            }
        }
        for field in &patch.clear {
            self.remove(keys::account_field(address, *field))?;
        }
        Ok(())
    }

    fn put_validator(&mut self, record: &ValidatorRecord) -> Result<(), StoreError> {
        self.write(keys::validator(&record.address), encode(record)?)
    }

    fn delete_validator(&mut self, address: &Address) -> Result<(), StoreError> {
        self.remove(keys::validator(address))
    }

    fn put_commission(&mut self, entry: &CommissionEntry) -> Result<(), StoreError> {
        self.write(
            keys::commission(&entry.address, entry.height),
            encode(&entry.commission)?,
        )
    }

    fn delete_commission(&mut self, address: &Address, height: u64) -> Result<(), StoreError> {
        self.remove(keys::commission(address, height))
    }

    /// Store a stake balance; zero deletes the row.
    fn set_stake(
        &mut self,
        staker: &Address,
        validator: &Address,
        amount: u64,
    ) -> Result<(), StoreError> {
        let key = keys::stake(staker, validator);
        if amount == 0 {
            self.remove(key)
        } else {
            self.write(key, encode(&amount)?)
        }
    }

    fn put_subscription(&mut self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        self.write(keys::subscription(&record.address), encode(record)?)
    }

    fn delete_subscription(&mut self, address: &Address) -> Result<(), StoreError> {
        self.remove(keys::subscription(address))
    }

    fn put_retry(&mut self, entry: &RetryEntry) -> Result<(), StoreError> {
        self.write(keys::retry(&entry.public_key), encode(entry)?)
    }

    fn delete_retry(&mut self, public_key: &PublicKey) -> Result<(), StoreError> {
        self.remove(keys::retry(public_key))
    }

    fn mark_indexed(&mut self, block: &Block) -> Result<(), StoreError> {
        self.write(keys::block(block.height()), serde_json::to_vec(block)?)
    }

    fn unmark_indexed(&mut self, height: u64) -> Result<(), StoreError> {
        self.remove(keys::block(height))
    }
}

impl<T: KvWrite + IndexReader + ?Sized> IndexWriter for T {}

macro_rules! impl_reward_ports {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CommissionHistory for $ty {
                fn commission_before(
                    &self,
                    address: &Address,
                    height: u64,
                ) -> Result<Option<u16>, RewardError> {
                    self.latest_commission_below(address, height)
                        .map(|entry| entry.map(|e| e.commission))
                        .map_err(|e| RewardError::Lookup(e.to_string()))
                }
            }

            impl StakeLedger for $ty {
                fn stakes_for_validator(
                    &self,
                    validator: &Address,
                ) -> Result<Vec<StakeRecord>, RewardError> {
                    self.stakes_on(validator)
                        .map_err(|e| RewardError::Lookup(e.to_string()))
                }
            }
        )*
    };
}

impl_reward_ports!(UnitOfWork<'_>, dyn KeyValueStore, InMemoryKVStore);
