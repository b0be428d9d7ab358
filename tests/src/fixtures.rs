//! Shared builders and mock collaborators for the integration flows.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use indexer_runtime::adapters::NodeRpcError;
use indexer_runtime::BlockSource;
use ix_02_index_store::{BatchOperation, InMemoryKVStore, KeyValueStore, StoreError};
use ix_03_account_index::{AccountIndex, TimeSource};
use ix_04_block_indexing::{BlockIndexingEngine, ProcessorRegistry};
use ix_05_pending_transactions::{PendingError, TransactionPoolSource};
use parking_lot::Mutex;
use serde_json::json;
use shared_types::{
    Address, Block, BlockHeader, BlockId, ChainEvent, PublicKey, Transaction, TransactionId,
};

pub const ALICE: PublicKey = PublicKey([0x11; 32]);
pub const BOB: PublicKey = PublicKey([0x22; 32]);
pub const CAROL: PublicKey = PublicKey([0x33; 32]);

// =============================================================================
// CHAIN BUILDERS
// =============================================================================

pub fn tx(
    n: u8,
    sender: PublicKey,
    module: &str,
    command: &str,
    params: serde_json::Value,
) -> Transaction {
    Transaction {
        id: TransactionId([n; 32]),
        module: module.into(),
        command: command.into(),
        sender_public_key: sender,
        nonce: n as u64,
        fee: 1_000 + n as u64,
        params,
        signatures: vec![],
    }
}

pub fn register_validator(n: u8, sender: PublicKey, name: &str) -> Transaction {
    tx(
        n,
        sender,
        "pos",
        "registerValidator",
        json!({
            "name": name,
            "blsKey": "aa".repeat(48),
            "proofOfPossession": "bb".repeat(96),
            "generatorKey": "cc".repeat(32),
        }),
    )
}

pub fn stake(n: u8, sender: PublicKey, validator: Address, amount: i64) -> Transaction {
    tx(
        n,
        sender,
        "pos",
        "stake",
        json!({
            "stakes": [{
                "validatorAddress": validator.to_string(),
                "amount": amount.to_string(),
            }]
        }),
    )
}

pub fn change_commission(n: u8, sender: PublicKey, rate: u16) -> Transaction {
    tx(n, sender, "pos", "changeCommission", json!({ "newCommission": rate }))
}

pub fn reward_minted(amount: u64) -> ChainEvent {
    ChainEvent {
        module: "dynamicReward".into(),
        name: "rewardMinted".into(),
        data: json!({ "amount": amount.to_string() }),
        topics: vec![],
        index: 0,
    }
}

/// Block whose id encodes its height and branch `tag`.
pub fn block(
    height: u64,
    tag: u8,
    previous: BlockId,
    generator: Address,
    transactions: Vec<Transaction>,
) -> Block {
    let mut id = [tag; 32];
    id[..8].copy_from_slice(&height.to_be_bytes());
    Block {
        header: BlockHeader {
            height,
            id: BlockId(id),
            previous_block_id: previous,
            timestamp: 1_700_000_000 + height * 10,
            generator_address: generator,
        },
        transactions,
        events: vec![],
    }
}

/// Empty blocks `0..len` on branch `tag`, each linked to its parent.
pub fn empty_chain(len: u64, tag: u8) -> Vec<Block> {
    extend_chain(Vec::new(), len, tag)
}

/// Append empty blocks on branch `tag` until the chain holds `len` blocks.
pub fn extend_chain(mut blocks: Vec<Block>, len: u64, tag: u8) -> Vec<Block> {
    while (blocks.len() as u64) < len {
        let height = blocks.len() as u64;
        let previous = blocks.last().map(Block::id).unwrap_or_default();
        blocks.push(block(height, tag, previous, Address([0xee; 20]), vec![]));
    }
    blocks
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Clock pinned to a settable millisecond value.
#[derive(Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn at(ms: u64) -> Self {
        Self(AtomicU64::new(ms))
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Store whose next `n` batch writes fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryKVStore,
    failures: Mutex<usize>,
}

impl FlakyStore {
    pub fn fail_next(&self, n: usize) {
        *self.failures.lock() = n;
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(StoreError::Io {
                    message: "disk unavailable".into(),
                });
            }
        }
        self.inner.atomic_batch_write(operations)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.inner.prefix_scan(prefix)
    }

    fn last_below(
        &self,
        prefix: &[u8],
        upper: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.inner.last_below(prefix, upper)
    }
}

/// Scriptable node chain for the synchronizer.
#[derive(Default)]
pub struct MockChain {
    blocks: Mutex<BTreeMap<u64, Block>>,
    pub fetches: AtomicUsize,
}

impl MockChain {
    /// Insert or replace blocks by height.
    pub fn set(&self, blocks: Vec<Block>) {
        let mut map = self.blocks.lock();
        for b in blocks {
            map.insert(b.height(), b);
        }
    }

    /// Drop every block above `height`.
    pub fn truncate(&self, height: u64) {
        self.blocks.lock().retain(|h, _| *h <= height);
    }
}

#[async_trait]
impl BlockSource for MockChain {
    async fn tip_height(&self) -> Result<u64, NodeRpcError> {
        Ok(self.blocks.lock().keys().last().copied().unwrap_or(0))
    }

    async fn block_at(&self, height: u64) -> Result<Block, NodeRpcError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.blocks
            .lock()
            .get(&height)
            .cloned()
            .ok_or_else(|| NodeRpcError::Rpc {
                method: "chain_getBlockByHeight".into(),
                code: -32000,
                message: format!("no block at {}", height),
            })
    }
}

/// Node transaction pool with a replaceable content.
#[derive(Default)]
pub struct MockPool {
    transactions: Mutex<Vec<Transaction>>,
}

impl MockPool {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Mutex::new(transactions),
        }
    }

    pub fn replace(&self, transactions: Vec<Transaction>) {
        *self.transactions.lock() = transactions;
    }
}

#[async_trait]
impl TransactionPoolSource for MockPool {
    async fn pool_transactions(&self) -> Result<Vec<Transaction>, PendingError> {
        Ok(self.transactions.lock().clone())
    }
}

// =============================================================================
// WIRING
// =============================================================================

/// Account index and engine sharing one store.
pub struct Indexer {
    pub store: Arc<dyn KeyValueStore>,
    pub accounts: Arc<AccountIndex>,
    pub engine: Arc<BlockIndexingEngine>,
}

impl Indexer {
    pub fn over(store: Arc<dyn KeyValueStore>) -> Self {
        let accounts = Arc::new(AccountIndex::new(store.clone(), Arc::new(FixedClock::at(1_000))));
        let engine = Arc::new(BlockIndexingEngine::new(
            store.clone(),
            Arc::new(ProcessorRegistry::builtin()),
            accounts.clone(),
        ));
        Self {
            store,
            accounts,
            engine,
        }
    }

    pub fn in_memory() -> Self {
        Self::over(Arc::new(InMemoryKVStore::new()))
    }
}
