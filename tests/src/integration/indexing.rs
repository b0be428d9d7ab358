//! # Block Indexing Flows
//!
//! The synchronizer drives the engine, which writes through the account
//! index into one store. Covers:
//!
//! 1. **Forward indexing**: registerValidator lands in validator, account
//!    and commission tables
//! 2. **Reorg**: a fork below the tip unwinds the losing branch in reverse
//! 3. **Idempotence**: re-applying an indexed block changes nothing
//! 4. **Persistence**: the same flow over RocksDB

use std::sync::Arc;
use std::time::Duration;

use indexer_runtime::adapters::{RocksDbConfig, RocksDbStore};
use indexer_runtime::{BlockSynchronizer, SyncSettings};
use ix_02_index_store::{IndexReader, KeyValueStore};
use ix_03_account_index::{AccountFilter, AccountIndexApi};
use ix_04_block_indexing::{BlockIndexingApi, IndexOutcome, RevertOutcome};
use proptest::prelude::*;
use shared_bus::{EventFilter, IndexerEvent, InMemoryEventBus, Subscription};
use shared_types::{Address, Block};
use tempfile::TempDir;

use crate::fixtures::*;

type Rows = Vec<(Vec<u8>, Vec<u8>)>;

fn rows(store: &dyn KeyValueStore) -> Rows {
    store.prefix_scan(b"").unwrap()
}

fn synchronizer(
    chain: Arc<MockChain>,
    indexer: &Indexer,
    bus: Arc<InMemoryEventBus>,
) -> BlockSynchronizer {
    BlockSynchronizer::new(
        chain,
        indexer.engine.clone(),
        bus,
        SyncSettings {
            fetch_backoff: Duration::from_millis(1),
            ..SyncSettings::default()
        },
    )
}

fn drain(sub: &mut Subscription) -> Vec<IndexerEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = sub.try_recv() {
        events.push(event);
    }
    events
}

/// Heights 0..=3; ALICE registers at height 1.
fn chain_with_registration() -> Vec<Block> {
    let mut blocks = empty_chain(1, 1);
    blocks.push(block(
        1,
        1,
        blocks[0].id(),
        Address([0xee; 20]),
        vec![register_validator(1, ALICE, "genesis_0")],
    ));
    extend_chain(blocks, 4, 1)
}

/// Heights 1..=4 branching off genesis on tag 2, with no transactions.
fn competing_branch(genesis: &Block) -> Vec<Block> {
    let mut fork: Vec<Block> = Vec::new();
    for height in 1..=4u64 {
        let previous = fork.last().map(Block::id).unwrap_or_else(|| genesis.id());
        fork.push(block(height, 2, previous, Address([0xee; 20]), vec![]));
    }
    fork
}

#[tokio::test]
async fn test_register_validator_indexed_through_synchronizer() {
    let indexer = Indexer::in_memory();
    let chain = Arc::new(MockChain::default());
    let bus = Arc::new(InMemoryEventBus::new());
    let mut events = bus.subscribe(EventFilter::all());
    chain.set(chain_with_registration());

    synchronizer(chain, &indexer, bus).catch_up(3).await.unwrap();

    let address = ALICE.address();
    let validator = indexer.store.validator(&address).unwrap().unwrap();
    assert_eq!(validator.name, "genesis_0");
    assert_eq!(validator.registration_height, 1);
    // Registration opens the history at the maximum rate.
    assert_eq!(indexer.store.commission_at(&address, 1).unwrap(), Some(10_000));

    let accounts = indexer
        .accounts
        .query_accounts(&AccountFilter::by_name("genesis_0"))
        .unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].address, address);
    assert_eq!(accounts[0].public_key, Some(ALICE));
    assert!(accounts[0].is_validator);

    let indexed: Vec<(u64, usize)> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            IndexerEvent::BlockIndexed {
                height,
                transactions,
                ..
            } => Some((height, transactions)),
            _ => None,
        })
        .collect();
    assert_eq!(indexed, vec![(0, 0), (1, 1), (2, 0), (3, 0)]);
}

#[tokio::test]
async fn test_fork_reverts_registration() {
    let indexer = Indexer::in_memory();
    let chain = Arc::new(MockChain::default());
    let bus = Arc::new(InMemoryEventBus::new());
    let original = chain_with_registration();
    chain.set(original.clone());
    let sync = synchronizer(chain.clone(), &indexer, bus.clone());
    sync.catch_up(3).await.unwrap();

    let mut events = bus.subscribe(EventFilter::all());
    let fork = competing_branch(&original[0]);
    chain.set(fork.clone());
    sync.catch_up(4).await.unwrap();

    let reverted: Vec<u64> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            IndexerEvent::BlockReverted { height, .. } => Some(height),
            _ => None,
        })
        .collect();
    assert_eq!(reverted, vec![3, 2, 1]);

    let address = ALICE.address();
    assert_eq!(indexer.store.validator(&address).unwrap(), None);
    assert!(indexer.store.commission_history(&address).unwrap().is_empty());
    // The identity write survives; the validator fields do not.
    let account = indexer.store.account(&address).unwrap().unwrap();
    assert_eq!(account.public_key, Some(ALICE));
    assert_eq!(account.name, None);
    assert!(!account.is_validator);

    for b in &fork {
        assert_eq!(indexer.engine.indexed_block(b.height()).unwrap().unwrap().id(), b.id());
    }
}

#[tokio::test]
async fn test_deleted_block_notification_unwinds() {
    let indexer = Indexer::in_memory();
    let chain = Arc::new(MockChain::default());
    let bus = Arc::new(InMemoryEventBus::new());
    let blocks = chain_with_registration();
    chain.set(blocks.clone());
    let sync = synchronizer(chain.clone(), &indexer, bus);
    sync.catch_up(3).await.unwrap();

    chain.truncate(0);
    sync.handle_deleted(1, blocks[1].id()).await.unwrap();

    assert_eq!(indexer.engine.last_indexed_height().unwrap(), Some(0));
    assert_eq!(indexer.store.validator(&ALICE.address()).unwrap(), None);
}

#[test]
fn test_reapply_is_a_noop() {
    let indexer = Indexer::in_memory();
    let genesis = block(0, 1, Default::default(), Address([0xee; 20]), vec![]);
    let b = block(
        1,
        1,
        genesis.id(),
        Address([0xee; 20]),
        vec![
            register_validator(1, ALICE, "genesis_0"),
            stake(2, BOB, ALICE.address(), 5_000),
        ],
    );
    indexer.engine.index_block(&genesis).unwrap();
    assert_eq!(
        indexer.engine.index_block(&b).unwrap(),
        IndexOutcome::Indexed {
            applied: 2,
            skipped: 0
        }
    );
    let after_first = rows(indexer.store.as_ref());

    assert_eq!(indexer.engine.index_block(&b).unwrap(), IndexOutcome::AlreadyIndexed);
    assert_eq!(rows(indexer.store.as_ref()), after_first);
}

#[test]
fn test_revert_then_reapply_restores_tables() {
    let indexer = Indexer::in_memory();
    let validator = ALICE.address();
    let setup = block(
        1,
        1,
        Default::default(),
        validator,
        vec![register_validator(1, ALICE, "genesis_0")],
    );
    let mut b = block(
        2,
        1,
        setup.id(),
        validator,
        vec![stake(2, BOB, validator, 3_000), change_commission(3, ALICE, 500)],
    );
    b.events.push(reward_minted(1_000_000));

    indexer.engine.index_block(&setup).unwrap();
    // Senders of `b` are resolved on first apply; seed them so only block
    // writes differ.
    indexer.accounts.resolve_and_upsert_by_public_key(&BOB);
    let before = rows(indexer.store.as_ref());

    indexer.engine.index_block(&b).unwrap();
    let applied = rows(indexer.store.as_ref());

    assert_eq!(
        indexer.engine.revert_block(&b).unwrap(),
        RevertOutcome::Reverted { reverted: 2 }
    );
    assert_eq!(rows(indexer.store.as_ref()), before);

    indexer.engine.index_block(&b).unwrap();
    assert_eq!(rows(indexer.store.as_ref()), applied);
}

#[tokio::test]
async fn test_reorg_over_rocksdb_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let validator = ALICE.address();
    let original = {
        let mut blocks = empty_chain(1, 1);
        blocks.push(block(
            1,
            1,
            blocks[0].id(),
            validator,
            vec![register_validator(1, ALICE, "genesis_0")],
        ));
        blocks.push(block(
            2,
            1,
            blocks[1].id(),
            validator,
            vec![stake(2, BOB, validator, 700)],
        ));
        blocks
    };

    {
        let store = Arc::new(RocksDbStore::open(RocksDbConfig::for_testing(dir.path())).unwrap());
        let indexer = Indexer::over(store);
        let chain = Arc::new(MockChain::default());
        chain.set(original.clone());
        let sync = synchronizer(chain.clone(), &indexer, Arc::new(InMemoryEventBus::new()));
        sync.catch_up(2).await.unwrap();
        assert_eq!(
            indexer.store.stake(&BOB.address(), &validator).unwrap().map(|s| s.amount),
            Some(700)
        );

        // Height 2 is replaced by a block staking a different amount.
        let mut fork = vec![block(
            2,
            2,
            original[1].id(),
            validator,
            vec![stake(3, BOB, validator, 250)],
        )];
        fork.push(block(3, 2, fork[0].id(), validator, vec![]));
        chain.set(fork);
        sync.catch_up(3).await.unwrap();
    }

    let store = RocksDbStore::open(RocksDbConfig::for_testing(dir.path())).unwrap();
    assert_eq!(store.last_indexed_height().unwrap(), Some(3));
    assert_eq!(
        store.stake(&BOB.address(), &validator).unwrap().map(|s| s.amount),
        Some(250)
    );
    assert_eq!(store.validator(&validator).unwrap().unwrap().name, "genesis_0");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_unwinding_any_suffix_restores_prefix_state(
        amounts in proptest::collection::vec(1i64..10_000, 2..6),
        keep in 0usize..5,
    ) {
        let indexer = Indexer::in_memory();
        let validator = ALICE.address();
        indexer.accounts.resolve_and_upsert_by_public_key(&ALICE);
        indexer.accounts.resolve_and_upsert_by_public_key(&BOB);

        let mut blocks: Vec<Block> = Vec::new();
        for (i, amount) in amounts.iter().enumerate() {
            let previous = blocks.last().map(Block::id).unwrap_or_default();
            blocks.push(block(
                i as u64,
                1,
                previous,
                validator,
                vec![stake(i as u8, BOB, validator, *amount)],
            ));
        }
        let keep = keep.min(blocks.len() - 1);

        let mut states = Vec::new();
        for b in &blocks {
            states.push(rows(indexer.store.as_ref()));
            indexer.engine.index_block(b).unwrap();
        }
        for b in blocks[keep..].iter().rev() {
            indexer.engine.revert_block(b).unwrap();
        }
        prop_assert_eq!(rows(indexer.store.as_ref()), states[keep].clone());
    }
}
