//! # Pending Pool Mirror
//!
//! The mirror annotates pool transactions with names from the account
//! index and filters receiving chains relative to the resolved local chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ix_04_block_indexing::BlockIndexingApi;
use ix_05_pending_transactions::{
    PendingFilter, PendingQuery, PendingRefresher, PendingTransactionMirror,
};
use ix_06_chain_resolver::{ChainContext, ChainResolverError, NodeInfoSource};
use serde_json::json;
use shared_bus::{EventFilter, EventPublisher, EventTopic, IndexerEvent, InMemoryEventBus};
use shared_types::{BlockId, ChainId, Transaction, TransactionId};
use tokio::sync::watch;

use crate::fixtures::*;

struct FixedNode(ChainId);

#[async_trait]
impl NodeInfoSource for FixedNode {
    async fn chain_id(&self) -> Result<ChainId, ChainResolverError> {
        Ok(self.0)
    }
}

fn chain(id: &str) -> ChainId {
    id.parse().unwrap()
}

fn transfer(n: u8, sender: shared_types::PublicKey, receiving_chain: Option<&str>) -> Transaction {
    let params = match receiving_chain {
        Some(id) => json!({
            "receivingChainID": id,
            "recipientAddress": CAROL.address().to_string(),
        }),
        None => json!({ "recipientAddress": CAROL.address().to_string() }),
    };
    tx(n, sender, "token", "transferCrossChain", params)
}

fn pool() -> MockPool {
    MockPool::new(vec![
        transfer(1, ALICE, None),
        transfer(2, BOB, Some("02000001")),
        transfer(3, BOB, Some("02000000")),
    ])
}

fn ids(query: &PendingQuery, mirror: &PendingTransactionMirror) -> Vec<TransactionId> {
    mirror
        .query(query)
        .unwrap()
        .data
        .into_iter()
        .map(|tx| tx.id)
        .collect()
}

fn to_chain(id: &str) -> PendingQuery {
    PendingQuery {
        filter: PendingFilter {
            receiving_chain_id: Some(chain(id)),
            ..PendingFilter::default()
        },
        ..PendingQuery::default()
    }
}

#[tokio::test]
async fn test_receiving_chain_filter_is_relative_to_local_chain() {
    let indexer = Indexer::in_memory();
    let context = Arc::new(ChainContext::new());
    context.resolve(&FixedNode(chain("02000000"))).await.unwrap();
    let mirror = PendingTransactionMirror::new(
        Arc::new(pool()),
        indexer.accounts.clone(),
        context,
        Duration::from_secs(1),
    );
    mirror.refresh().await;

    // The local chain selects transactions that never leave it.
    assert_eq!(ids(&to_chain("02000000"), &mirror), vec![TransactionId([1; 32])]);
    assert_eq!(ids(&to_chain("02000001"), &mirror), vec![TransactionId([2; 32])]);
    // No chain filter: everything, highest fee first.
    assert_eq!(
        ids(&PendingQuery::default(), &mirror),
        vec![TransactionId([3; 32]), TransactionId([2; 32]), TransactionId([1; 32])]
    );
}

#[tokio::test]
async fn test_unresolved_chain_falls_back_to_exact_match() {
    let indexer = Indexer::in_memory();
    let mirror = PendingTransactionMirror::new(
        Arc::new(pool()),
        indexer.accounts.clone(),
        Arc::new(ChainContext::new()),
        Duration::from_secs(1),
    );
    mirror.refresh().await;

    assert_eq!(ids(&to_chain("02000000"), &mirror), vec![TransactionId([3; 32])]);
}

#[tokio::test]
async fn test_sender_names_come_from_indexed_registrations() {
    let indexer = Indexer::in_memory();
    indexer
        .engine
        .index_block(&block(
            1,
            1,
            BlockId::default(),
            ALICE.address(),
            vec![register_validator(9, ALICE, "genesis_0")],
        ))
        .unwrap();
    let mirror = PendingTransactionMirror::new(
        Arc::new(pool()),
        indexer.accounts.clone(),
        Arc::new(ChainContext::with_chain_id(chain("02000000"))),
        Duration::from_secs(1),
    );
    mirror.refresh().await;

    let page = mirror.query(&to_chain("02000000")).unwrap();
    assert_eq!(page.data[0].sender.name.as_deref(), Some("genesis_0"));
    assert_eq!(page.data[0].recipient_address, Some(CAROL.address()));
    assert!(page.data[0].is_pending);

    let page = mirror.query(&to_chain("02000001")).unwrap();
    assert_eq!(page.data[0].sender.name, None);
}

#[tokio::test(start_paused = true)]
async fn test_refresher_follows_indexed_blocks() {
    let indexer = Indexer::in_memory();
    let pool = Arc::new(MockPool::new(vec![transfer(1, ALICE, None)]));
    let mirror = Arc::new(PendingTransactionMirror::new(
        pool.clone(),
        indexer.accounts.clone(),
        Arc::new(ChainContext::with_chain_id(chain("02000000"))),
        Duration::from_secs(1),
    ));
    let bus = Arc::new(InMemoryEventBus::new());
    let mut refreshes = bus.subscribe(EventFilter::topics(vec![EventTopic::PendingPool]));
    let triggers = bus.subscribe(EventFilter::topics(vec![EventTopic::Node, EventTopic::Indexing]));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let refresher = PendingRefresher::new(mirror.clone(), bus.clone(), Duration::from_secs(3600));
    let handle = tokio::spawn(refresher.run(triggers, shutdown_rx));

    // Immediate first tick.
    assert_eq!(
        refreshes.recv().await,
        Some(IndexerEvent::PendingSnapshotRefreshed { size: 1 })
    );

    // A block confirmed the transfer and a new one arrived.
    pool.replace(vec![transfer(2, BOB, None), transfer(3, BOB, Some("02000001"))]);
    bus.publish(IndexerEvent::BlockIndexed {
        height: 1,
        id: BlockId([1; 32]),
        transactions: 1,
    })
    .await;
    assert_eq!(
        refreshes.recv().await,
        Some(IndexerEvent::PendingSnapshotRefreshed { size: 2 })
    );
    assert_eq!(mirror.len(), 2);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}
