//! # Node Notifications to Indexed Blocks
//!
//! Raw node notifications are parsed onto the bus, the synchronizer reacts
//! and indexes, and an unsupported command halts it with an event.

use std::sync::Arc;
use std::time::Duration;

use indexer_runtime::adapters::parse_notification;
use indexer_runtime::{BlockSynchronizer, IndexerConfig, SyncSettings};
use ix_02_index_store::IndexReader;
use ix_04_block_indexing::BlockIndexingApi;
use serde_json::json;
use shared_bus::{EventFilter, EventPublisher, EventTopic, IndexerEvent, InMemoryEventBus};
use shared_types::{Address, Block};
use tokio::sync::watch;

use crate::fixtures::*;

fn new_block_notification(block: &Block) -> String {
    json!({
        "jsonrpc": "2.0",
        "method": "chain_newBlock",
        "params": { "blockHeader": { "height": block.height(), "id": block.id().to_hex() } }
    })
    .to_string()
}

async fn next_indexing_event(sub: &mut shared_bus::Subscription) -> IndexerEvent {
    tokio::time::timeout(Duration::from_secs(60), sub.recv())
        .await
        .expect("no indexing event")
        .expect("bus closed")
}

#[tokio::test(start_paused = true)]
async fn test_notifications_drive_indexing_until_halt() {
    let indexer = Indexer::in_memory();
    let chain = Arc::new(MockChain::default());
    let bus = Arc::new(InMemoryEventBus::new());
    let mut outcomes =
        bus.subscribe(EventFilter::topics(vec![EventTopic::Indexing, EventTopic::Halt]));
    let node_events = bus.subscribe(EventFilter::topics(vec![EventTopic::Node]));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut blocks = empty_chain(1, 1);
    chain.set(blocks.clone());
    let sync = BlockSynchronizer::new(
        chain.clone(),
        indexer.engine.clone(),
        bus.clone(),
        SyncSettings {
            fetch_backoff: Duration::from_millis(10),
            poll_interval: Duration::from_secs(3600),
            ..SyncSettings::default()
        },
    );
    let handle = tokio::spawn(sync.run(node_events, shutdown_rx));

    // First poll indexes genesis.
    assert!(matches!(
        next_indexing_event(&mut outcomes).await,
        IndexerEvent::BlockIndexed { height: 0, .. }
    ));

    blocks.push(block(
        1,
        1,
        blocks[0].id(),
        Address([0xee; 20]),
        vec![register_validator(1, ALICE, "genesis_0")],
    ));
    chain.set(blocks.clone());
    let event = parse_notification(&new_block_notification(&blocks[1])).unwrap();
    bus.publish(event).await;
    assert_eq!(
        next_indexing_event(&mut outcomes).await,
        IndexerEvent::BlockIndexed {
            height: 1,
            id: blocks[1].id(),
            transactions: 1,
        }
    );
    assert!(indexer.store.validator(&ALICE.address()).unwrap().is_some());

    blocks.push(block(
        2,
        1,
        blocks[1].id(),
        Address([0xee; 20]),
        vec![tx(2, BOB, "nft", "mint", json!({}))],
    ));
    chain.set(blocks.clone());
    bus.publish(parse_notification(&new_block_notification(&blocks[2])).unwrap())
        .await;

    match next_indexing_event(&mut outcomes).await {
        IndexerEvent::IndexingHalted { height, id, reason } => {
            assert_eq!(height, 2);
            assert_eq!(id, blocks[2].id());
            assert!(reason.contains("nft"), "{}", reason);
        }
        other => panic!("expected halt, got {:?}", other),
    }
    // A halted synchronizer stops on its own.
    tokio::time::timeout(Duration::from_secs(60), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(indexer.engine.last_indexed_height().unwrap(), Some(1));
    // Late observers still see the halt.
    assert_eq!(bus.halted().map(|n| n.height), Some(2));
}

#[test]
fn test_config_file_and_environment_layering() {
    let mut config = IndexerConfig::from_toml(
        r#"
        [node]
        rpc_url = "http://10.0.0.5:7887/rpc"
        fetch_retries = 5

        [workers]
        start_height = 100
        "#,
    )
    .unwrap();
    config.apply_env_overrides(|key| match key {
        "IX_NODE_WS_URL" => Some("ws://10.0.0.5:7887/rpc-ws".to_string()),
        "IX_MAINCHAIN_SERVICE_URL" => Some("http://localhost:9901".to_string()),
        _ => None,
    });
    config.validate().unwrap();

    assert_eq!(config.node.rpc_url, "http://10.0.0.5:7887/rpc");
    assert_eq!(config.node.ws_url, "ws://10.0.0.5:7887/rpc-ws");
    assert_eq!(config.node.fetch_retries, 5);
    assert_eq!(config.workers.start_height, 100);
    assert_eq!(config.chain.mainchain_service_url.as_deref(), Some("http://localhost:9901"));
    // Untouched sections keep their defaults.
    assert_eq!(config.retry_interval(), Duration::from_secs(30));
}
