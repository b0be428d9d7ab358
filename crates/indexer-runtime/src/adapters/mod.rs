//! # Adapters
//!
//! Port implementations connecting the subsystems to the outside world.
//!
//! - `node_rpc`: JSON-RPC over HTTP (chain identity, blocks, pool, channels)
//! - `node_events`: WebSocket subscription relaying node events to the bus
//! - `rocksdb_store`: durable `KeyValueStore` for every index table

pub mod node_events;
pub mod node_rpc;
pub mod rocksdb_store;

pub use node_events::{parse_notification, NodeEventSubscriber, SUBSCRIBED_TOPICS};
pub use node_rpc::{missing_actions, NodeInfo, NodeRpcClient, NodeRpcError, REQUIRED_ACTIONS};
pub use rocksdb_store::{RocksDbConfig, RocksDbStore};
