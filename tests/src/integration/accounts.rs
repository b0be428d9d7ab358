//! # Identity Writes and the Retry Queue
//!
//! Sender public keys are written outside the block's unit of work. A
//! failed write never fails the block; the key is queued and the retry
//! worker converges the account table.

use std::sync::Arc;
use std::time::Duration;

use ix_02_index_store::IndexReader;
use ix_03_account_index::{AccountIndexApi, RetryWorker, ValidatorFilter, ValidatorSort};
use ix_04_block_indexing::{BlockIndexingApi, IndexOutcome};
use shared_types::{BlockId, Pagination};
use tokio::sync::watch;

use crate::fixtures::*;

fn flaky_indexer() -> (Arc<FlakyStore>, Indexer) {
    let store = Arc::new(FlakyStore::default());
    let indexer = Indexer::over(store.clone());
    (store, indexer)
}

#[test]
fn test_failed_sender_write_does_not_fail_block() {
    let (store, indexer) = flaky_indexer();
    let validator = ALICE.address();
    let b = block(
        7,
        1,
        BlockId::default(),
        validator,
        vec![stake(1, BOB, validator, 10), stake(2, CAROL, validator, 20)],
    );

    // BOB's identity write fails; the queue write and everything after succeed.
    store.fail_next(1);
    assert_eq!(
        indexer.engine.index_block(&b).unwrap(),
        IndexOutcome::Indexed {
            applied: 2,
            skipped: 0
        }
    );

    assert_eq!(indexer.accounts.retry_queue_depth().unwrap(), 1);
    let queued = store.inner.retry_entry(&BOB).unwrap().unwrap();
    assert_eq!(queued.enqueued_at, 1_000);
    assert_eq!(store.inner.account(&BOB.address()).unwrap(), None);
    assert_eq!(
        store.inner.account(&CAROL.address()).unwrap().unwrap().public_key,
        Some(CAROL)
    );
    assert_eq!(
        store.inner.stake(&BOB.address(), &validator).unwrap().map(|s| s.amount),
        Some(10)
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_worker_converges_account_table() {
    let (store, indexer) = flaky_indexer();
    let validator = ALICE.address();
    let b = block(7, 1, BlockId::default(), validator, vec![stake(1, BOB, validator, 10)]);
    store.fail_next(1);
    indexer.engine.index_block(&b).unwrap();
    assert_eq!(indexer.accounts.retry_queue_depth().unwrap(), 1);

    // The first drain fails as well and bumps the attempt count.
    store.fail_next(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = RetryWorker::new(indexer.accounts.clone(), Duration::from_secs(30));
    let handle = tokio::spawn(worker.run(shutdown_rx));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.inner.retry_entry(&BOB).unwrap().unwrap().attempts, 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(indexer.accounts.retry_queue_depth().unwrap(), 0);
    assert_eq!(
        store.inner.account(&BOB.address()).unwrap().unwrap().public_key,
        Some(BOB)
    );

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[test]
fn test_validator_listing_over_indexed_registrations() {
    let indexer = Indexer::in_memory();
    let generator = ALICE.address();
    let registrations = [(ALICE, "genesis_2"), (BOB, "genesis_0"), (CAROL, "genesis_1")];
    for (i, (pk, name)) in registrations.iter().enumerate() {
        let height = i as u64 + 1;
        indexer
            .engine
            .index_block(&block(
                height,
                1,
                BlockId::default(),
                generator,
                vec![register_validator(i as u8 + 1, *pk, name)],
            ))
            .unwrap();
    }

    let page = indexer
        .accounts
        .query_validators(&ValidatorFilter {
            sort: ValidatorSort::NameDesc,
            page: Pagination::new(0, 2),
            ..ValidatorFilter::default()
        })
        .unwrap();
    let names: Vec<&str> = page.data.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["genesis_2", "genesis_1"]);
    assert_eq!(page.meta.total, 3);

    let by_name = indexer
        .accounts
        .query_validators(&ValidatorFilter {
            name: Some("genesis_0".into()),
            ..ValidatorFilter::default()
        })
        .unwrap();
    assert_eq!(by_name.data.len(), 1);
    assert_eq!(by_name.data[0].address, BOB.address());
}
