//! # Processor Registry
//!
//! Maps `(module, command)` to an apply/revert pair. The compiled-in table
//! lives in [`crate::processors::BUILTIN`]; [`ProcessorRegistry::discover`]
//! keeps the entries the connected node actually runs.

use std::collections::{BTreeSet, HashMap};

use ix_02_index_store::UnitOfWork;
use tracing::{info, warn};

use crate::domain::{NodeMetadata, Phase, ProcessorContext, ProcessorError};
use crate::processors::BUILTIN;

/// Apply or revert one transaction inside the block's unit of work.
pub type ProcessorFn = fn(&ProcessorContext<'_>, &mut UnitOfWork<'_>) -> Result<(), ProcessorError>;

#[derive(Clone, Copy)]
pub struct Processor {
    pub apply: ProcessorFn,
    pub revert: ProcessorFn,
}

/// A compiled-in processor entry.
pub struct ProcessorEntry {
    pub module: &'static str,
    pub command: &'static str,
    pub processor: Processor,
}

/// Outcome of matching the node's catalogue against the compiled-in table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// `module:command` pairs with a processor.
    pub registered: Vec<String>,
    /// Node commands without a processor. Blocks carrying them cannot be indexed.
    pub unsupported: Vec<String>,
}

#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<(String, String), Processor>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every compiled-in processor, regardless of what the node runs.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for entry in BUILTIN {
            registry.register(
                entry.module,
                entry.command,
                entry.processor.apply,
                entry.processor.revert,
            );
        }
        registry
    }

    /// Register the compiled-in processors for the commands `metadata` lists.
    pub fn discover(metadata: &NodeMetadata) -> (Self, DiscoveryReport) {
        let mut registry = Self::new();
        let mut report = DiscoveryReport::default();
        let node_commands: BTreeSet<(&str, &str)> = metadata.commands().collect();

        for (module, command) in node_commands {
            match BUILTIN.iter().find(|e| e.module == module && e.command == command) {
                Some(entry) => {
                    registry.register(
                        module,
                        command,
                        entry.processor.apply,
                        entry.processor.revert,
                    );
                    report.registered.push(format!("{}:{}", module, command));
                }
                None => {
                    warn!(module, command, "Node command has no processor");
                    report.unsupported.push(format!("{}:{}", module, command));
                }
            }
        }

        info!(
            registered = report.registered.len(),
            unsupported = report.unsupported.len(),
            "Processors discovered"
        );
        (registry, report)
    }

    pub fn register(
        &mut self,
        module: &str,
        command: &str,
        apply: ProcessorFn,
        revert: ProcessorFn,
    ) {
        self.processors
            .insert((module.to_string(), command.to_string()), Processor { apply, revert });
    }

    pub fn contains(&self, module: &str, command: &str) -> bool {
        self.processors
            .contains_key(&(module.to_string(), command.to_string()))
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run the processor for `ctx.transaction` in `phase`.
    pub fn dispatch(
        &self,
        phase: Phase,
        ctx: &ProcessorContext<'_>,
        uow: &mut UnitOfWork<'_>,
    ) -> Result<(), ProcessorError> {
        let tx = ctx.transaction;
        let processor = self
            .processors
            .get(&(tx.module.clone(), tx.command.clone()))
            .ok_or_else(|| ProcessorError::UnknownCommand {
                module: tx.module.clone(),
                command: tx.command.clone(),
            })?;
        match phase {
            Phase::Apply => (processor.apply)(ctx, uow),
            Phase::Revert => (processor.revert)(ctx, uow),
        }
    }
}
