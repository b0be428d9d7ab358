//! Per-block reward accounting on the generator's validator record.

use ix_01_reward_splitter::{split_reward, RewardShare};
use ix_02_index_store::{IndexReader, IndexWriter, UnitOfWork};
use shared_types::Block;
use tracing::trace;

use crate::domain::{Phase, ProcessorError};

/// Event carrying the minted block reward.
pub const REWARD_MINTED: &str = "rewardMinted";

/// Modules that mint block rewards, in lookup order.
pub const REWARD_MODULES: [&str; 2] = ["dynamicReward", "reward"];

/// Reward minted for this block's generator, if the block reports one.
pub fn minted_reward(block: &Block) -> Result<Option<u64>, ProcessorError> {
    let event = REWARD_MODULES.iter().find_map(|module| {
        block
            .events
            .iter()
            .find(|e| e.module == *module && e.name == REWARD_MINTED)
    });
    let Some(event) = event else {
        return Ok(None);
    };

    let amount = &event.data["amount"];
    let parsed = match amount {
        serde_json::Value::String(s) => s.parse::<u64>().ok(),
        other => other.as_u64(),
    };
    parsed.map(Some).ok_or_else(|| ProcessorError::InvalidParams {
        command: format!("{}:{}", event.module, REWARD_MINTED),
        reason: format!("unreadable amount {}", amount),
    })
}

/// Add (apply) or remove (revert) this block's commission and self-stake
/// reward on the generator's validator record.
///
/// Revert must run while the unit of work still holds the block's
/// post-transaction state, so the recomputed shares match the applied ones.
pub fn account_block_reward(
    uow: &mut UnitOfWork<'_>,
    block: &Block,
    phase: Phase,
) -> Result<Option<RewardShare>, ProcessorError> {
    let Some(reward) = minted_reward(block)? else {
        return Ok(None);
    };
    let generator = block.header.generator_address;
    let Some(mut validator) = uow.validator(&generator)? else {
        return Ok(None);
    };

    let share = split_reward(&*uow, &generator, block.height(), reward)?;
    match phase {
        Phase::Apply => {
            validator.total_commission = validator
                .total_commission
                .checked_add(share.commission)
                .ok_or(ProcessorError::Overflow("total commission"))?;
            validator.total_self_stake_rewards = validator
                .total_self_stake_rewards
                .checked_add(share.self_stake_reward)
                .ok_or(ProcessorError::Overflow("total self-stake rewards"))?;
        }
        Phase::Revert => {
            validator.total_commission = validator
                .total_commission
                .checked_sub(share.commission)
                .ok_or(ProcessorError::Overflow("total commission"))?;
            validator.total_self_stake_rewards = validator
                .total_self_stake_rewards
                .checked_sub(share.self_stake_reward)
                .ok_or(ProcessorError::Overflow("total self-stake rewards"))?;
        }
    }
    uow.put_validator(&validator)?;

    trace!(
        block_height = block.height(),
        generator = %generator,
        reward,
        commission = share.commission,
        self_stake_reward = share.self_stake_reward,
        phase = phase.as_str(),
        "Block reward accounted"
    );
    Ok(Some(share))
}
