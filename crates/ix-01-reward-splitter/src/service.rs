//! # Reward Splitter Service
//!
//! Resolves the inputs of the reward formulas from the history store.

use primitive_types::U256;
use shared_types::Address;
use tracing::trace;

use crate::domain::{commission_of, self_stake_share, RewardError, RewardShare};
use crate::ports::{CommissionHistory, StakeLedger};

/// Commission owed to `generator` for a block at `height`.
///
/// Uses the most recent rate recorded strictly below `height`; a change made
/// in the same block only affects later blocks. No history means rate 0.
pub fn commission_amount<H: CommissionHistory + ?Sized>(
    history: &H,
    generator: &Address,
    height: u64,
    reward: u64,
) -> Result<u64, RewardError> {
    let rate = history.commission_before(generator, height)?.unwrap_or(0);
    let commission = commission_of(reward, rate)?;
    trace!(%generator, height, rate, commission, "Commission computed");
    Ok(commission)
}

/// Share of the post-commission reward earned by the generator's own stake.
pub fn self_stake_reward<L: StakeLedger + ?Sized>(
    ledger: &L,
    generator: &Address,
    reward: u64,
    commission: u64,
) -> Result<u64, RewardError> {
    let stakes = ledger.stakes_for_validator(generator)?;

    let mut total = U256::zero();
    let mut own = U256::zero();
    for stake in &stakes {
        let amount = U256::from(stake.amount);
        total = total
            .checked_add(amount)
            .ok_or(RewardError::Overflow("total stake"))?;
        if stake.staker == *generator {
            own = own
                .checked_add(amount)
                .ok_or(RewardError::Overflow("self stake"))?;
        }
    }

    self_stake_share(reward, commission, own, total)
}

/// Both shares for one block reward.
pub fn split_reward<S: CommissionHistory + StakeLedger + ?Sized>(
    source: &S,
    generator: &Address,
    height: u64,
    reward: u64,
) -> Result<RewardShare, RewardError> {
    let commission = commission_amount(source, generator, height, reward)?;
    let self_stake_reward = self_stake_reward(source, generator, reward, commission)?;
    Ok(RewardShare {
        commission,
        self_stake_reward,
    })
}
