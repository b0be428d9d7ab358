//! Pool transactions as served to callers.

use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{Address, ChainId, HexBytes, PublicKey, Transaction, TransactionId};

/// Status every mirrored transaction reports.
pub const EXECUTION_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderInfo {
    pub address: Address,
    pub public_key: PublicKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A pool transaction annotated with its sender identity.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub id: TransactionId,
    pub module: String,
    pub command: String,
    pub module_command: String,
    #[serde_as(as = "DisplayFromStr")]
    pub nonce: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub fee: u64,
    pub sender_public_key: PublicKey,
    pub sender: SenderInfo,
    pub params: serde_json::Value,
    pub signatures: Vec<HexBytes>,
    #[serde(rename = "receivingChainID", skip_serializing_if = "Option::is_none")]
    pub receiving_chain_id: Option<ChainId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<Address>,
    pub is_pending: bool,
    pub execution_status: &'static str,
}

impl PendingTransaction {
    /// Normalize a raw pool transaction. `name` is the sender's registered
    /// name, when known.
    pub fn from_pool(tx: Transaction, name: Option<String>) -> Self {
        let receiving_chain_id =
            param_str(&tx.params, "receivingChainID").and_then(|s| s.parse().ok());
        let recipient_address =
            param_str(&tx.params, "recipientAddress").and_then(|s| s.parse().ok());
        let sender = SenderInfo {
            address: tx.sender_address(),
            public_key: tx.sender_public_key,
            name,
        };
        Self {
            module_command: tx.module_command(),
            id: tx.id,
            module: tx.module,
            command: tx.command,
            nonce: tx.nonce,
            fee: tx.fee,
            sender_public_key: tx.sender_public_key,
            sender,
            params: tx.params,
            signatures: tx.signatures,
            receiving_chain_id,
            recipient_address,
            is_pending: true,
            execution_status: EXECUTION_STATUS_PENDING,
        }
    }
}

fn param_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(serde_json::Value::as_str)
}
