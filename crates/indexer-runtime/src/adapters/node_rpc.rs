//! # Node JSON-RPC Client
//!
//! Request/response access to the node over HTTP. One client backs every
//! outbound port the subsystems declare for the node: chain identity, local
//! channels, the transaction pool and block fetching.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ix_04_block_indexing::NodeMetadata;
use ix_05_pending_transactions::{PendingError, TransactionPoolSource};
use ix_06_chain_resolver::{ChainResolverError, ChannelInfo, ChannelSource, NodeInfoSource};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use shared_types::{Block, BlockHeader, ChainEvent, ChainId, Transaction};
use thiserror::Error;
use tracing::{trace, warn};

use crate::sync::BlockSource;

/// Endpoints the indexer calls on the node.
pub const REQUIRED_ACTIONS: &[&str] = &[
    "system_getNodeInfo",
    "system_getMetadata",
    "chain_getBlockByHeight",
    "chain_getEvents",
    "txpool_getTransactionsFromPool",
    "interoperability_getChannel",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeRpcError {
    #[error("Node unreachable: {0}")]
    Transport(String),

    #[error("Node RPC error {code} on {method}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Node response to {method} missing result")]
    MissingResult { method: String },

    #[error("Failed to decode {method} response: {reason}")]
    Decode { method: String, reason: String },
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `system_getNodeInfo`, reduced to what the indexer reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeInfo {
    #[serde(rename = "chainID")]
    pub chain_id: ChainId,
    pub height: u64,
}

/// `chain_getBlockByHeight` body. Events arrive through a separate call.
#[derive(Debug, Deserialize)]
struct RawBlock {
    header: BlockHeader,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

pub struct NodeRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
}

impl NodeRpcClient {
    /// Every call is bounded by `timeout`.
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, NodeRpcError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeRpcError::Transport(format!("HTTP client setup: {e}")))?;

        Ok(Self {
            http_client,
            rpc_url: rpc_url.into(),
            request_id: AtomicU64::new(1),
        })
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, NodeRpcError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        trace!(method, id, "Node RPC call");

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NodeRpcError::Transport(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NodeRpcError::Transport(e.to_string()))?;
        decode_response(method, body)
    }

    pub async fn node_info(&self) -> Result<NodeInfo, NodeRpcError> {
        self.call("system_getNodeInfo", json!({})).await
    }

    pub async fn metadata(&self) -> Result<NodeMetadata, NodeRpcError> {
        self.call("system_getMetadata", json!({})).await
    }

    pub async fn registered_actions(&self) -> Result<Vec<String>, NodeRpcError> {
        self.call("app_getRegisteredActions", json!({})).await
    }

    /// Block at `height` together with its event log.
    pub async fn block_by_height(&self, height: u64) -> Result<Block, NodeRpcError> {
        let raw: RawBlock = self
            .call("chain_getBlockByHeight", json!({ "height": height }))
            .await?;
        let events: Vec<ChainEvent> = self
            .call("chain_getEvents", json!({ "height": height }))
            .await?;
        Ok(Block {
            header: raw.header,
            transactions: raw.transactions,
            events,
        })
    }

    pub async fn pool(&self) -> Result<Vec<Transaction>, NodeRpcError> {
        self.call("txpool_getTransactionsFromPool", json!({})).await
    }

    pub async fn channel(&self, chain_id: &ChainId) -> Result<ChannelInfo, NodeRpcError> {
        self.call(
            "interoperability_getChannel",
            json!({ "chainID": chain_id.to_hex() }),
        )
        .await
    }

    /// Log every required endpoint the node does not expose. Returns them.
    pub async fn check_registered_actions(&self) -> Result<Vec<&'static str>, NodeRpcError> {
        let registered = self.registered_actions().await?;
        let missing = missing_actions(&registered);
        for action in &missing {
            warn!(action, "Node does not expose a required endpoint");
        }
        Ok(missing)
    }
}

/// Required endpoints absent from `registered`.
pub fn missing_actions(registered: &[String]) -> Vec<&'static str> {
    REQUIRED_ACTIONS
        .iter()
        .copied()
        .filter(|action| !registered.iter().any(|r| r == action))
        .collect()
}

fn decode_response<R: DeserializeOwned>(
    method: &str,
    body: serde_json::Value,
) -> Result<R, NodeRpcError> {
    let response: JsonRpcResponse<serde_json::Value> =
        serde_json::from_value(body).map_err(|e| NodeRpcError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(error) = response.error {
        return Err(NodeRpcError::Rpc {
            method: method.to_string(),
            code: error.code,
            message: error.message,
        });
    }
    let result = response.result.ok_or_else(|| NodeRpcError::MissingResult {
        method: method.to_string(),
    })?;
    serde_json::from_value(result).map_err(|e| NodeRpcError::Decode {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl NodeInfoSource for NodeRpcClient {
    async fn chain_id(&self) -> Result<ChainId, ChainResolverError> {
        self.node_info()
            .await
            .map(|info| info.chain_id)
            .map_err(|e| ChainResolverError::Node(e.to_string()))
    }
}

#[async_trait]
impl ChannelSource for NodeRpcClient {
    async fn get_channel(&self, chain_id: &ChainId) -> Result<ChannelInfo, ChainResolverError> {
        self.channel(chain_id).await.map_err(|e| match e {
            NodeRpcError::Transport(reason) => ChainResolverError::Transport(reason),
            NodeRpcError::Decode { reason, .. } => ChainResolverError::InvalidResponse(reason),
            other => ChainResolverError::Node(other.to_string()),
        })
    }
}

#[async_trait]
impl TransactionPoolSource for NodeRpcClient {
    async fn pool_transactions(&self) -> Result<Vec<Transaction>, PendingError> {
        self.pool()
            .await
            .map_err(|e| PendingError::Source(e.to_string()))
    }
}

#[async_trait]
impl BlockSource for NodeRpcClient {
    async fn tip_height(&self) -> Result<u64, NodeRpcError> {
        Ok(self.node_info().await?.height)
    }

    async fn block_at(&self, height: u64) -> Result<Block, NodeRpcError> {
        self.block_by_height(height).await
    }
}
