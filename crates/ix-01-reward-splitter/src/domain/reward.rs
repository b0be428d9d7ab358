//! Reward formulas over [`Q96`]. Every result is floored.

use primitive_types::U256;
use shared_types::MAX_COMMISSION;

use super::errors::RewardError;
use super::q96::Q96;

/// Commission and self-stake reward taken from one block reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardShare {
    pub commission: u64,
    pub self_stake_reward: u64,
}

/// `floor(reward * rate / MAX_COMMISSION)`.
pub fn commission_of(reward: u64, rate: u16) -> Result<u64, RewardError> {
    if rate > MAX_COMMISSION {
        return Err(RewardError::InvalidRate(rate));
    }
    Q96::from_int(reward)
        .mul(Q96::from_int(u64::from(rate)))?
        .div(Q96::from_int(u64::from(MAX_COMMISSION)))?
        .floor_u64()
}

/// `floor((reward - commission) * self_stake / total_stake)`, or zero when
/// nothing is staked.
pub fn self_stake_share(
    reward: u64,
    commission: u64,
    self_stake: U256,
    total_stake: U256,
) -> Result<u64, RewardError> {
    if commission > reward {
        return Err(RewardError::CommissionExceedsReward { commission, reward });
    }
    if total_stake.is_zero() {
        return Ok(0);
    }
    Q96::from_int(reward - commission)
        .mul(Q96::from_u256(self_stake)?)?
        .div(Q96::from_u256(total_stake)?)?
        .floor_u64()
}
