//! Entities that exist only in storage.

use serde::{Deserialize, Serialize};
use shared_types::PublicKey;

/// A public key waiting for its account row to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryEntry {
    pub public_key: PublicKey,
    /// Unix milliseconds of the first failed attempt.
    pub enqueued_at: u64,
    /// Failed attempts so far, including the one that enqueued it.
    pub attempts: u32,
}
