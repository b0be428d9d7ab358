//! # Chain Entities
//!
//! Blocks, transactions and events as delivered by the node, plus the fixed
//! width identifiers they carry.
//!
//! ## Clusters
//!
//! - **Identifiers**: `PublicKey`, `BlockId`, `TransactionId`, `ChainId`, `HexBytes`
//! - **Chain**: `Block`, `BlockHeader`, `Transaction`, `ChainEvent`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DeserializeFromStr, DisplayFromStr, SerializeDisplay};

use crate::address::Address;
use crate::errors::ParseError;

/// Declares a fixed-width byte identifier rendered as lowercase hex.
macro_rules! hex_identifier {
    ($(#[$meta:meta])* $name:ident, $len:expr, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
            SerializeDisplay, DeserializeFromStr,
        )]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LENGTH: usize = $len;

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
                let arr: [u8; $len] = bytes.try_into().map_err(|_| ParseError::InvalidLength {
                    kind: $kind,
                    expected: $len,
                    actual: bytes.len(),
                })?;
                Ok(Self(arr))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }
        }
    };
}

hex_identifier!(
    /// A 32-byte Ed25519 public key.
    PublicKey, 32, "public key"
);

hex_identifier!(
    /// A 32-byte block identifier.
    BlockId, 32, "block id"
);

hex_identifier!(
    /// A 32-byte transaction identifier.
    TransactionId, 32, "transaction id"
);

hex_identifier!(
    /// A 4-byte chain identifier. Byte 0 is the network identifier, the
    /// remaining bytes select the chain within that network.
    ChainId, 4, "chain id"
);

impl PublicKey {
    /// Address owned by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl ChainId {
    /// Network identifier byte.
    pub fn network_id(&self) -> u8 {
        self.0[0]
    }

    /// Mainchain IDs carry zeroes after the network byte.
    pub fn is_mainchain(&self) -> bool {
        self.0[1..].iter().all(|b| *b == 0)
    }

    /// The mainchain of this chain's network.
    pub fn mainchain(&self) -> ChainId {
        ChainId([self.0[0], 0, 0, 0])
    }
}

/// Variable-length byte payload rendered as hex (BLS keys, proofs of possession).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, SerializeDisplay, DeserializeFromStr)]
pub struct HexBytes(pub Vec<u8>);

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl FromStr for HexBytes {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s)
            .map(HexBytes)
            .map_err(|e| ParseError::InvalidHex(e.to_string()))
    }
}

// =============================================================================
// THE CHAIN
// =============================================================================

/// Block header fields the indexer relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub height: u64,
    pub id: BlockId,
    #[serde(rename = "previousBlockID")]
    pub previous_block_id: BlockId,
    pub timestamp: u64,
    pub generator_address: Address,
}

/// A transaction inside a block or the unconfirmed pool.
///
/// `params` stays schemaless here; each command processor decodes the shape
/// it expects.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub module: String,
    pub command: String,
    pub sender_public_key: PublicKey,
    #[serde_as(as = "DisplayFromStr")]
    pub nonce: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub fee: u64,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub signatures: Vec<HexBytes>,
}

impl Transaction {
    /// `module:command`, the processor registry key.
    pub fn module_command(&self) -> String {
        format!("{}:{}", self.module, self.command)
    }

    pub fn sender_address(&self) -> Address {
        self.sender_public_key.address()
    }
}

/// An entry of the node's per-block event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub module: String,
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub index: u32,
}

/// Name of the event each transaction emits with its execution outcome.
pub const COMMAND_EXECUTION_RESULT: &str = "commandExecutionResult";

/// Prefix the node puts on topics raised during transaction execution.
pub const TRANSACTION_EXECUTION_TOPIC_PREFIX: &str = "04";

impl ChainEvent {
    /// Whether this event is the execution result for `tx_id`. The first
    /// topic is the transaction id, prefixed or bare.
    pub fn is_execution_result_for(&self, tx_id: &TransactionId) -> bool {
        if self.name != COMMAND_EXECUTION_RESULT {
            return false;
        }
        let Some(topic) = self.topics.first() else {
            return false;
        };
        let id = tx_id.to_hex();
        let topic = topic.strip_prefix("0x").unwrap_or(topic);
        topic.eq_ignore_ascii_case(&id)
            || topic
                .strip_prefix(TRANSACTION_EXECUTION_TOPIC_PREFIX)
                .is_some_and(|rest| rest.eq_ignore_ascii_case(&id))
    }
}

/// A block with its transactions and event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub events: Vec<ChainEvent>,
}

impl Block {
    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn id(&self) -> BlockId {
        self.header.id
    }

    /// Execution outcome of a transaction in this block. Transactions with no
    /// result event are treated as successful.
    pub fn transaction_succeeded(&self, tx_id: &TransactionId) -> bool {
        self.events
            .iter()
            .find(|e| e.is_execution_result_for(tx_id))
            .and_then(|e| e.data.get("success").and_then(serde_json::Value::as_bool))
            .unwrap_or(true)
    }
}
