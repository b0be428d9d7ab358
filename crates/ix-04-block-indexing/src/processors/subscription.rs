//! Service subscriptions.

use ix_02_index_store::{IndexReader, IndexWriter, UnitOfWork};
use shared_types::SubscriptionRecord;

use crate::domain::{ProcessorContext, ProcessorError};

/// Record the sender's subscription. The params are kept verbatim as the
/// subscription metadata.
pub fn create(ctx: &ProcessorContext<'_>, uow: &mut UnitOfWork<'_>) -> Result<(), ProcessorError> {
    let address = ctx.sender();
    if uow.subscription(&address)?.is_some() {
        return Err(ProcessorError::AlreadyExists {
            kind: "subscription",
            address,
        });
    }
    uow.put_subscription(&SubscriptionRecord {
        address,
        metadata: ctx.transaction.params.to_string(),
        created_at_height: ctx.height(),
        transaction_id: ctx.transaction.id,
    })?;
    Ok(())
}

/// Delete the subscription. The sender's account row is left alone.
pub fn revert_create(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    uow.delete_subscription(&ctx.sender())?;
    Ok(())
}
