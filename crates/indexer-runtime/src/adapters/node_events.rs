//! # Node Event Subscription
//!
//! Keeps a WebSocket subscription to the node open and relays block and
//! pool notifications onto the event bus. Reconnects with exponential
//! backoff; events missed while disconnected are recovered by the
//! synchronizer's tip poll.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use shared_bus::{EventPublisher, IndexerEvent};
use shared_types::{BlockId, TransactionId};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Node topics relayed onto the bus.
pub const SUBSCRIBED_TOPICS: &[&str] =
    &["chain_newBlock", "chain_deleteBlock", "txpool_newTransaction"];

/// Base delay between reconnection attempts.
const RECONNECT_BASE_DELAY_SECS: u64 = 1;

/// Maximum delay between reconnection attempts.
const MAX_RECONNECT_DELAY_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: SubscribeParams<'a>,
    id: u64,
}

#[derive(Debug, Serialize)]
struct SubscribeParams<'a> {
    topics: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct Notification {
    method: Option<String>,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct HeaderRef {
    height: u64,
    id: BlockId,
}

#[derive(Debug, Deserialize)]
struct TransactionRef {
    id: TransactionId,
}

/// Translate one node message into a bus event. Subscription acks, unknown
/// topics and malformed payloads yield `None`.
pub fn parse_notification(text: &str) -> Option<IndexerEvent> {
    let notification: Notification = serde_json::from_str(text).ok()?;
    let method = notification.method?;
    let params = notification.params;

    match method.as_str() {
        "chain_newBlock" | "chain_deleteBlock" => {
            let header: HeaderRef =
                serde_json::from_value(params.get("blockHeader")?.clone()).ok()?;
            Some(if method == "chain_newBlock" {
                IndexerEvent::BlockAccepted {
                    height: header.height,
                    id: header.id,
                }
            } else {
                IndexerEvent::BlockDeleted {
                    height: header.height,
                    id: header.id,
                }
            })
        }
        "txpool_newTransaction" => {
            let tx: TransactionRef =
                serde_json::from_value(params.get("transaction")?.clone()).ok()?;
            Some(IndexerEvent::PendingTransactionReceived { id: tx.id })
        }
        _ => None,
    }
}

pub struct NodeEventSubscriber {
    ws_url: String,
    publisher: Arc<dyn EventPublisher>,
}

impl NodeEventSubscriber {
    pub fn new(ws_url: impl Into<String>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            ws_url: ws_url.into(),
            publisher,
        }
    }

    /// Stay subscribed until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut reconnect_attempts = 0u32;
        loop {
            tokio::select! {
                result = self.run_connection(&mut reconnect_attempts) => {
                    if let Err(e) = result {
                        warn!(url = %self.ws_url, error = %e, "Node subscription lost");
                    }
                }
                _ = shutdown.changed() => break,
            }

            reconnect_attempts = reconnect_attempts.saturating_add(1);
            let delay = backoff_delay(reconnect_attempts);
            debug!(
                attempt = reconnect_attempts,
                delay_secs = delay.as_secs(),
                "Reconnecting to node"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }
        info!("Node subscription stopped");
    }

    async fn run_connection(&self, reconnect_attempts: &mut u32) -> Result<()> {
        let (ws_stream, _) = connect_async(self.ws_url.as_str())
            .await
            .context("Failed to connect to node WebSocket")?;
        let (mut write, mut read) = ws_stream.split();

        let request = SubscribeRequest {
            jsonrpc: "2.0",
            method: "subscribe",
            params: SubscribeParams {
                topics: SUBSCRIBED_TOPICS,
            },
            id: 1,
        };
        write
            .send(Message::Text(serde_json::to_string(&request)?.into()))
            .await
            .context("Failed to send subscription")?;
        info!(url = %self.ws_url, topics = ?SUBSCRIBED_TOPICS, "Subscribed to node events");
        *reconnect_attempts = 0;

        while let Some(message) = read.next().await {
            match message.context("WebSocket read failed")? {
                Message::Text(text) => {
                    if let Some(event) = parse_notification(&text) {
                        self.publisher.publish(event).await;
                    }
                }
                Message::Ping(data) => {
                    write.send(Message::Pong(data)).await?;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        anyhow::bail!("connection closed by node")
    }
}

fn backoff_delay(attempts: u32) -> Duration {
    Duration::from_secs(std::cmp::min(
        RECONNECT_BASE_DELAY_SECS.saturating_mul(1 << attempts.min(6)),
        MAX_RECONNECT_DELAY_SECS,
    ))
}
