//! # Account Index Subsystem (ix-03)
//!
//! Secondary index over accounts and validators, plus the durable queue of
//! public keys whose account write has not landed yet.
//!
//! ## Identity Writes
//!
//! ```text
//! resolve_and_upsert_by_public_key(pk)
//!     ├── ok ──────→ account/<address>/publicKey  (own batch, not the block's)
//!     └── failure ─→ retry/<pk>  ──RetryWorker──→ drain_retry_queue()
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | Identity failures never fail the caller | `resolve_and_upsert_by_public_key` returns an outcome, not a `Result` |
//! | 2 | A queued key leaves the queue only once its write committed | Account write and retry removal share one batch |
//! | 3 | Re-draining a resolved key is harmless | Already-indexed keys just drop their queue entry |
//! | 4 | Account queries name at least one criterion | `AccountFilter::validate` |

pub mod domain;
pub mod ports;
pub mod service;
pub mod worker;

pub use domain::*;
pub use ports::{AccountIndexApi, SystemTimeSource, TimeSource};
pub use service::AccountIndex;
pub use worker::RetryWorker;
