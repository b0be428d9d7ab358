//! Query filters and operation outcomes.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Pagination, PublicKey};

use super::errors::AccountIndexError;

/// Account lookup. At least one criterion is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountFilter {
    pub address: Option<Address>,
    pub public_key: Option<PublicKey>,
    pub name: Option<String>,
}

impl AccountFilter {
    pub fn by_address(address: Address) -> Self {
        Self {
            address: Some(address),
            ..Self::default()
        }
    }

    pub fn by_public_key(public_key: PublicKey) -> Self {
        Self {
            public_key: Some(public_key),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), AccountIndexError> {
        if self.address.is_none() && self.public_key.is_none() && self.name.is_none() {
            return Err(AccountIndexError::Usage(
                "one of address, publicKey or name is required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidatorSort {
    #[default]
    NameAsc,
    NameDesc,
}

/// Validator listing. Every criterion is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorFilter {
    pub address: Option<Address>,
    pub name: Option<String>,
    pub sort: ValidatorSort,
    #[serde(flatten)]
    pub page: Pagination,
}

impl ValidatorFilter {
    pub fn validate(&self) -> Result<(), AccountIndexError> {
        self.page
            .validate()
            .map_err(|e| AccountIndexError::Usage(e.to_string()))
    }
}

/// What happened to one identity write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The public key is now stored on the account.
    Indexed(Address),
    /// The account already carried this public key.
    AlreadyIndexed(Address),
    /// The write failed; the key waits in the retry queue.
    Queued,
    /// The write failed and the key could not be queued either.
    Dropped,
}

/// Summary of one pass over the retry queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub remaining: usize,
}
