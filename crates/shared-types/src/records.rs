//! # Index Records
//!
//! Derived rows maintained by the indexer. Accounts are stored field by field
//! (see [`AccountField`]) so independent writers never clobber each other;
//! every other record is stored whole.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::address::Address;
use crate::entities::{HexBytes, PublicKey, TransactionId};

/// Upper bound of a commission rate, in hundredths of a percent.
pub const MAX_COMMISSION: u16 = 10_000;

/// Individually addressable account columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum AccountField {
    PublicKey = 1,
    Name = 2,
    IsValidator = 3,
    BlsKey = 4,
    ProofOfPossession = 5,
    GeneratorKey = 6,
}

impl AccountField {
    pub const ALL: [AccountField; 6] = [
        AccountField::PublicKey,
        AccountField::Name,
        AccountField::IsValidator,
        AccountField::BlsKey,
        AccountField::ProofOfPossession,
        AccountField::GeneratorKey,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }
}

/// A single account column value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountFieldValue {
    PublicKey(PublicKey),
    Name(String),
    IsValidator(bool),
    BlsKey(HexBytes),
    ProofOfPossession(HexBytes),
    GeneratorKey(PublicKey),
}

impl AccountFieldValue {
    pub fn field(&self) -> AccountField {
        match self {
            Self::PublicKey(_) => AccountField::PublicKey,
            Self::Name(_) => AccountField::Name,
            Self::IsValidator(_) => AccountField::IsValidator,
            Self::BlsKey(_) => AccountField::BlsKey,
            Self::ProofOfPossession(_) => AccountField::ProofOfPossession,
            Self::GeneratorKey(_) => AccountField::GeneratorKey,
        }
    }
}

/// A partial update: fields to set and fields to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub set: Vec<AccountFieldValue>,
    pub clear: Vec<AccountField>,
}

impl AccountPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public_key(mut self, key: PublicKey) -> Self {
        self.set.push(AccountFieldValue::PublicKey(key));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.set.push(AccountFieldValue::Name(name.into()));
        self
    }

    pub fn is_validator(mut self, flag: bool) -> Self {
        self.set.push(AccountFieldValue::IsValidator(flag));
        self
    }

    pub fn bls_key(mut self, key: HexBytes) -> Self {
        self.set.push(AccountFieldValue::BlsKey(key));
        self
    }

    pub fn proof_of_possession(mut self, proof: HexBytes) -> Self {
        self.set.push(AccountFieldValue::ProofOfPossession(proof));
        self
    }

    pub fn generator_key(mut self, key: PublicKey) -> Self {
        self.set.push(AccountFieldValue::GeneratorKey(key));
        self
    }

    pub fn clear(mut self, field: AccountField) -> Self {
        self.clear.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.clear.is_empty()
    }
}

/// Account row keyed by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub address: Address,
    pub public_key: Option<PublicKey>,
    pub name: Option<String>,
    pub is_validator: bool,
    pub bls_key: Option<HexBytes>,
    pub proof_of_possession: Option<HexBytes>,
    pub generator_key: Option<PublicKey>,
}

impl AccountRecord {
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            public_key: None,
            name: None,
            is_validator: false,
            bls_key: None,
            proof_of_possession: None,
            generator_key: None,
        }
    }

    /// Fold one stored column into the record.
    pub fn apply(&mut self, value: AccountFieldValue) {
        match value {
            AccountFieldValue::PublicKey(v) => self.public_key = Some(v),
            AccountFieldValue::Name(v) => self.name = Some(v),
            AccountFieldValue::IsValidator(v) => self.is_validator = v,
            AccountFieldValue::BlsKey(v) => self.bls_key = Some(v),
            AccountFieldValue::ProofOfPossession(v) => self.proof_of_possession = Some(v),
            AccountFieldValue::GeneratorKey(v) => self.generator_key = Some(v),
        }
    }
}

/// Validator row keyed by address.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorRecord {
    pub address: Address,
    pub name: String,
    pub bls_key: HexBytes,
    pub proof_of_possession: HexBytes,
    pub generator_key: PublicKey,
    pub registration_height: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub total_commission: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub total_self_stake_rewards: u64,
    /// Generator keys replaced by `updateGeneratorKey`, oldest first.
    #[serde(default)]
    pub generator_key_history: Vec<PublicKey>,
}

/// Commission rate in effect for `address` from `height` on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub address: Address,
    pub height: u64,
    pub commission: u16,
}

/// Amount staked by `staker` on `validator`. Zero-amount rows are never stored.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRecord {
    pub staker: Address,
    pub validator: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u64,
}

/// Subscription created by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub address: Address,
    /// Raw JSON metadata as submitted in the transaction params.
    pub metadata: String,
    pub created_at_height: u64,
    pub transaction_id: TransactionId,
}
