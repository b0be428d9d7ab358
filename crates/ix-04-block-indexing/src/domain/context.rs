//! What a processor sees of the block it runs in.

use shared_types::{Address, BlockHeader, ChainEvent, Transaction};

/// Direction of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Apply,
    Revert,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Apply => "apply",
            Phase::Revert => "revert",
        }
    }
}

pub struct ProcessorContext<'a> {
    pub header: &'a BlockHeader,
    pub transaction: &'a Transaction,
    /// The whole block's event log.
    pub events: &'a [ChainEvent],
}

impl<'a> ProcessorContext<'a> {
    pub fn new(
        header: &'a BlockHeader,
        transaction: &'a Transaction,
        events: &'a [ChainEvent],
    ) -> Self {
        Self {
            header,
            transaction,
            events,
        }
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn sender(&self) -> Address {
        self.transaction.sender_address()
    }
}
