//! # Block Indexing Engine
//!
//! Applies and reverts whole blocks. Every table write of a block goes
//! through one [`UnitOfWork`]; an error anywhere drops it, so a block is
//! either fully indexed or not at all.

use std::collections::BTreeSet;
use std::sync::Arc;

use ix_02_index_store::{IndexReader, IndexWriter, KeyValueStore, StoreError, UnitOfWork};
use ix_03_account_index::AccountIndexApi;
use shared_types::{Block, PublicKey, Transaction};
use tracing::{debug, info};

use crate::domain::{IndexingError, Phase, ProcessorContext, ProcessorError};
use crate::ports::{BlockIndexingApi, IndexOutcome, RevertOutcome};
use crate::registry::ProcessorRegistry;
use crate::rewards::account_block_reward;

pub struct BlockIndexingEngine {
    store: Arc<dyn KeyValueStore>,
    registry: Arc<ProcessorRegistry>,
    accounts: Arc<dyn AccountIndexApi>,
}

impl BlockIndexingEngine {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        registry: Arc<ProcessorRegistry>,
        accounts: Arc<dyn AccountIndexApi>,
    ) -> Self {
        Self {
            store,
            registry,
            accounts,
        }
    }

    /// Record every sender's public key. Runs outside the block's unit of
    /// work and never fails the block.
    fn index_senders(&self, block: &Block) {
        let senders: BTreeSet<PublicKey> = block
            .transactions
            .iter()
            .map(|tx| tx.sender_public_key)
            .collect();
        for public_key in &senders {
            self.accounts.resolve_and_upsert_by_public_key(public_key);
        }
    }

    fn run_transactions<'b>(
        &self,
        uow: &mut UnitOfWork<'_>,
        block: &Block,
        phase: Phase,
        transactions: impl Iterator<Item = &'b Transaction>,
    ) -> Result<(usize, usize), IndexingError> {
        let mut dispatched = 0;
        let mut skipped = 0;
        for tx in transactions {
            if !block.transaction_succeeded(&tx.id) {
                debug!(transaction = %tx.id, "Skipping failed transaction");
                skipped += 1;
                continue;
            }
            let ctx = ProcessorContext::new(&block.header, tx, &block.events);
            self.registry
                .dispatch(phase, &ctx, uow)
                .map_err(|e| transaction_error(block, tx, e))?;
            dispatched += 1;
        }
        Ok((dispatched, skipped))
    }
}

fn transaction_error(block: &Block, tx: &Transaction, error: ProcessorError) -> IndexingError {
    match error {
        ProcessorError::UnknownCommand { module, command } => IndexingError::UnknownCommand {
            height: block.height(),
            id: block.id(),
            module,
            command,
        },
        ProcessorError::Store(source) => store_error(block, source),
        source => IndexingError::Processor {
            height: block.height(),
            id: block.id(),
            transaction: tx.id,
            source,
        },
    }
}

fn reward_error(block: &Block, error: ProcessorError) -> IndexingError {
    match error {
        ProcessorError::Store(source) => store_error(block, source),
        source => IndexingError::Reward {
            height: block.height(),
            id: block.id(),
            source,
        },
    }
}

fn store_error(block: &Block, source: StoreError) -> IndexingError {
    IndexingError::Store {
        height: block.height(),
        id: block.id(),
        source,
    }
}

impl BlockIndexingApi for BlockIndexingEngine {
    fn index_block(&self, block: &Block) -> Result<IndexOutcome, IndexingError> {
        let store = self.store.as_ref();
        match store
            .indexed_block(block.height())
            .map_err(|e| store_error(block, e))?
        {
            Some(indexed) if indexed.id() == block.id() => {
                debug!(
                    block_height = block.height(),
                    block_id = %block.id(),
                    "Block already indexed"
                );
                return Ok(IndexOutcome::AlreadyIndexed);
            }
            Some(indexed) => {
                return Err(IndexingError::HeightConflict {
                    height: block.height(),
                    indexed: indexed.id(),
                    incoming: block.id(),
                });
            }
            None => {}
        }

        self.index_senders(block);

        let mut uow = UnitOfWork::begin(store);
        let (applied, skipped) =
            self.run_transactions(&mut uow, block, Phase::Apply, block.transactions.iter())?;
        account_block_reward(&mut uow, block, Phase::Apply).map_err(|e| reward_error(block, e))?;
        uow.mark_indexed(block).map_err(|e| store_error(block, e))?;
        let operations = uow.commit().map_err(|e| store_error(block, e))?;

        info!(
            block_height = block.height(),
            block_id = %block.id(),
            applied,
            skipped,
            operations,
            "Block indexed"
        );
        Ok(IndexOutcome::Indexed { applied, skipped })
    }

    fn revert_block(&self, block: &Block) -> Result<RevertOutcome, IndexingError> {
        let store = self.store.as_ref();
        let indexed = match store
            .indexed_block(block.height())
            .map_err(|e| store_error(block, e))?
        {
            Some(indexed) if indexed.id() == block.id() => indexed,
            _ => {
                debug!(
                    block_height = block.height(),
                    block_id = %block.id(),
                    "Block not indexed, nothing to revert"
                );
                return Ok(RevertOutcome::NotIndexed);
            }
        };
        let tip = store
            .last_indexed_height()
            .map_err(|e| store_error(block, e))?;
        if let Some(tip) = tip.filter(|tip| *tip != indexed.height()) {
            return Err(IndexingError::NotTip {
                height: indexed.height(),
                id: indexed.id(),
                tip,
            });
        }

        // Undo in the stored copy's order, whatever the caller passed in.
        let mut uow = UnitOfWork::begin(store);
        account_block_reward(&mut uow, &indexed, Phase::Revert)
            .map_err(|e| reward_error(&indexed, e))?;
        let (reverted, _) = self.run_transactions(
            &mut uow,
            &indexed,
            Phase::Revert,
            indexed.transactions.iter().rev(),
        )?;
        uow.unmark_indexed(indexed.height())
            .map_err(|e| store_error(&indexed, e))?;
        uow.commit().map_err(|e| store_error(&indexed, e))?;

        info!(
            block_height = indexed.height(),
            block_id = %indexed.id(),
            reverted,
            "Block reverted"
        );
        Ok(RevertOutcome::Reverted { reverted })
    }

    fn indexed_block(&self, height: u64) -> Result<Option<Block>, StoreError> {
        self.store.indexed_block(height)
    }

    fn last_indexed_height(&self) -> Result<Option<u64>, StoreError> {
        self.store.last_indexed_height()
    }
}
