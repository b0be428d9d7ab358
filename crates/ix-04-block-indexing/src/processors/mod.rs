//! # Command Processors
//!
//! One apply/revert pair per state-changing command. Each pair must leave
//! every table it writes exactly as it found it after apply then revert.
//! Commands that touch no index table are registered with [`neutral`] so
//! they are never mistaken for unknown ones.

pub mod pos;
pub mod subscription;

use serde::de::DeserializeOwned;

use crate::domain::{ProcessorContext, ProcessorError};
use crate::registry::{Processor, ProcessorEntry};
use ix_02_index_store::UnitOfWork;

macro_rules! entry {
    ($module:literal, $command:literal, $apply:path, $revert:path) => {
        ProcessorEntry {
            module: $module,
            command: $command,
            processor: Processor {
                apply: $apply,
                revert: $revert,
            },
        }
    };
    ($module:literal, $command:literal) => {
        entry!($module, $command, neutral, neutral)
    };
}

/// Every processor this build knows.
pub static BUILTIN: &[ProcessorEntry] = &[
    entry!("pos", "registerValidator", pos::register_validator, pos::revert_register_validator),
    entry!("pos", "changeCommission", pos::change_commission, pos::revert_change_commission),
    entry!("pos", "stake", pos::stake, pos::revert_stake),
    entry!(
        "pos",
        "updateGeneratorKey",
        pos::update_generator_key,
        pos::revert_update_generator_key
    ),
    entry!("pos", "unlock"),
    entry!("pos", "claimRewards"),
    entry!("pos", "reportMisbehavior"),
    entry!("subscription", "create", subscription::create, subscription::revert_create),
    entry!("token", "transfer"),
    entry!("token", "transferCrossChain"),
    entry!("auth", "registerMultisignature"),
    entry!("legacy", "reclaimLSK"),
    entry!("legacy", "registerKeys"),
    entry!("interoperability", "submitMainchainCrossChainUpdate"),
    entry!("interoperability", "submitSidechainCrossChainUpdate"),
    entry!("interoperability", "initializeMessageRecovery"),
    entry!("interoperability", "recoverMessage"),
    entry!("interoperability", "registerMainchain"),
    entry!("interoperability", "registerSidechain"),
    entry!("interoperability", "terminateSidechainForLiveness"),
];

/// Processor for commands with no index effect.
pub fn neutral(_: &ProcessorContext<'_>, _: &mut UnitOfWork<'_>) -> Result<(), ProcessorError> {
    Ok(())
}

/// Decode the transaction params into the command's shape.
pub(crate) fn params<T: DeserializeOwned>(ctx: &ProcessorContext<'_>) -> Result<T, ProcessorError> {
    serde_json::from_value(ctx.transaction.params.clone()).map_err(|e| {
        ProcessorError::InvalidParams {
            command: ctx.transaction.module_command(),
            reason: e.to_string(),
        }
    })
}
