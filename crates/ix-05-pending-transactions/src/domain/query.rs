//! Pool query filters and ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use shared_types::{Address, ChainId, Pagination, TransactionId};

use super::errors::PendingError;
use super::view::PendingTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Fee,
    Nonce,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// `field:order`, e.g. `fee:desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct PendingSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for PendingSort {
    fn default() -> Self {
        Self {
            field: SortField::Fee,
            order: SortOrder::Desc,
        }
    }
}

impl PendingSort {
    pub fn compare(&self, a: &PendingTransaction, b: &PendingTransaction) -> Ordering {
        let primary = match self.field {
            SortField::Fee => a.fee.cmp(&b.fee),
            SortField::Nonce => a.nonce.cmp(&b.nonce),
            SortField::Id => a.id.cmp(&b.id),
        }
        .then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        }
    }
}

impl fmt::Display for PendingSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Fee => "fee",
            SortField::Nonce => "nonce",
            SortField::Id => "id",
        };
        let order = match self.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        write!(f, "{}:{}", field, order)
    }
}

impl FromStr for PendingSort {
    type Err = PendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PendingError::InvalidSort(s.to_string());
        let (field, order) = s.split_once(':').ok_or_else(invalid)?;
        let field = match field {
            "fee" => SortField::Fee,
            "nonce" => SortField::Nonce,
            "id" => SortField::Id,
            _ => return Err(invalid()),
        };
        let order = match order {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => return Err(invalid()),
        };
        Ok(Self { field, order })
    }
}

/// Equality filters over the pool. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PendingFilter {
    pub id: Option<TransactionId>,
    pub sender_address: Option<Address>,
    pub module_command: Option<String>,
    /// Sender or recipient.
    pub address: Option<Address>,
    #[serde(rename = "receivingChainID")]
    pub receiving_chain_id: Option<ChainId>,
}

impl PendingFilter {
    /// `current_chain` is the local chain id when resolved. Asking for the
    /// local chain selects transactions with no receiving chain at all.
    pub fn matches(&self, tx: &PendingTransaction, current_chain: Option<&ChainId>) -> bool {
        if self.id.is_some_and(|id| tx.id != id) {
            return false;
        }
        if self.sender_address.is_some_and(|a| tx.sender.address != a) {
            return false;
        }
        if self
            .module_command
            .as_deref()
            .is_some_and(|mc| tx.module_command != mc)
        {
            return false;
        }
        if self
            .address
            .is_some_and(|a| tx.sender.address != a && tx.recipient_address != Some(a))
        {
            return false;
        }
        match &self.receiving_chain_id {
            None => true,
            Some(wanted) if Some(wanted) == current_chain => tx.receiving_chain_id.is_none(),
            Some(wanted) => tx.receiving_chain_id.as_ref() == Some(wanted),
        }
    }
}

/// A full pool query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PendingQuery {
    #[serde(flatten)]
    pub filter: PendingFilter,
    pub sort: PendingSort,
    #[serde(flatten)]
    pub page: Pagination,
}

impl PendingQuery {
    pub fn validate(&self) -> Result<(), PendingError> {
        self.page
            .validate()
            .map_err(|_| PendingError::InvalidLimit(self.page.limit))
    }
}
