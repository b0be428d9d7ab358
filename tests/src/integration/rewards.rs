//! # Reward Split Against Indexed History
//!
//! Commission and stake rows written by block processors feed the Q96
//! reward formulas directly from the store.

use ix_01_reward_splitter::{commission_amount, split_reward, RewardShare};
use ix_02_index_store::IndexReader;
use ix_04_block_indexing::BlockIndexingApi;
use shared_types::{Address, Block, BlockId};

use crate::fixtures::*;

const REWARD: u64 = 100_000_000;

fn at(height: u64, generator: Address, transactions: Vec<shared_types::Transaction>) -> Block {
    block(height, 1, BlockId::default(), generator, transactions)
}

#[test]
fn test_split_uses_rate_and_stakes_from_indexed_blocks() {
    let indexer = Indexer::in_memory();
    let alice = ALICE.address();
    indexer
        .engine
        .index_block(&at(
            1,
            alice,
            vec![
                register_validator(1, ALICE, "genesis_0"),
                stake(2, ALICE, alice, 100),
                stake(3, BOB, alice, 200),
            ],
        ))
        .unwrap();
    indexer
        .engine
        .index_block(&at(2, alice, vec![change_commission(4, ALICE, 2_500)]))
        .unwrap();

    let store = indexer.store.as_ref();
    assert_eq!(
        split_reward(store, &alice, 3, REWARD).unwrap(),
        RewardShare {
            commission: 25_000_000,
            self_stake_reward: 25_000_000,
        }
    );
    // Unknown generator: no history, no stakes.
    assert_eq!(
        split_reward(store, &CAROL.address(), 3, REWARD).unwrap(),
        RewardShare::default()
    );
}

#[test]
fn test_commission_rate_in_force_is_strictly_below_height() {
    let indexer = Indexer::in_memory();
    let alice = ALICE.address();
    indexer
        .engine
        .index_block(&at(10, alice, vec![register_validator(1, ALICE, "genesis_0")]))
        .unwrap();
    indexer
        .engine
        .index_block(&at(50, alice, vec![change_commission(2, ALICE, 2_000)]))
        .unwrap();

    let store = indexer.store.as_ref();
    let rate = |height| {
        store
            .latest_commission_below(&alice, height)
            .unwrap()
            .map(|e| e.commission)
    };
    assert_eq!(rate(49), Some(10_000));
    assert_eq!(rate(50), Some(10_000));
    assert_eq!(rate(51), Some(2_000));
    assert_eq!(rate(5), None);

    assert_eq!(commission_amount(store, &alice, 49, REWARD).unwrap(), REWARD);
    assert_eq!(commission_amount(store, &alice, 51, REWARD).unwrap(), 20_000_000);
    assert_eq!(commission_amount(store, &alice, 5, REWARD).unwrap(), 0);
}

#[test]
fn test_block_rewards_accumulate_on_validator() {
    let indexer = Indexer::in_memory();
    let alice = ALICE.address();
    indexer
        .engine
        .index_block(&at(
            1,
            alice,
            vec![register_validator(1, ALICE, "genesis_0"), stake(2, ALICE, alice, 1_000)],
        ))
        .unwrap();
    indexer
        .engine
        .index_block(&at(2, alice, vec![change_commission(3, ALICE, 1_000)]))
        .unwrap();

    for height in 3..=4 {
        let mut b = at(height, alice, vec![]);
        b.events.push(reward_minted(REWARD));
        indexer.engine.index_block(&b).unwrap();
    }

    // 10% commission, the rest earned entirely by the only (own) stake.
    let validator = indexer.store.validator(&alice).unwrap().unwrap();
    assert_eq!(validator.total_commission, 2 * 10_000_000);
    assert_eq!(validator.total_self_stake_rewards, 2 * 90_000_000);

    let mut last = at(4, alice, vec![]);
    last.events.push(reward_minted(REWARD));
    indexer.engine.revert_block(&last).unwrap();
    let validator = indexer.store.validator(&alice).unwrap().unwrap();
    assert_eq!(validator.total_commission, 10_000_000);
    assert_eq!(validator.total_self_stake_rewards, 90_000_000);
}
