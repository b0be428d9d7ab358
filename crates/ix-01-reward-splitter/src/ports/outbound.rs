//! # Outbound Ports
//!
//! Read access the splitter needs from the history store.

use shared_types::{Address, StakeRecord};

use crate::domain::RewardError;

/// Height-ordered commission rate changes.
pub trait CommissionHistory {
    /// Rate recorded for `address` at the greatest height strictly below
    /// `height`, if any.
    fn commission_before(&self, address: &Address, height: u64) -> Result<Option<u16>, RewardError>;
}

/// Current stake balances.
pub trait StakeLedger {
    /// Every stake placed on `validator`, including its own.
    fn stakes_for_validator(&self, validator: &Address) -> Result<Vec<StakeRecord>, RewardError>;
}
