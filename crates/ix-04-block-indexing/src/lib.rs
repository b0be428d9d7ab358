//! # Block Indexing Subsystem (ix-04)
//!
//! Turns blocks into index-table changes and takes them back out on reorgs.
//!
//! ## Block Lifecycle
//!
//! ```text
//! index_block(B)                               revert_block(B)
//!   ├─ senders → account index (own batch)       ├─ reward accounting (undo)
//!   ├─ UnitOfWork                                ├─ tx[n-1] … tx[0] revert
//!   │    ├─ tx[0] … tx[n-1] apply                ├─ unmark B
//!   │    ├─ reward accounting                    └─ commit
//!   │    ├─ mark B indexed
//!   │    └─ commit
//!   └─ any error → UnitOfWork dropped
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | A block is indexed completely or not at all | One `UnitOfWork` per block |
//! | 2 | Revert undoes apply exactly | Per-processor inverse tests; reverse transaction order |
//! | 3 | Re-indexing the same block changes nothing | Indexed-block marker checked first |
//! | 4 | No state-changing transaction is skipped silently | Unregistered commands fail with `UnknownCommand` |
//! | 5 | Transactions that failed on chain touch nothing | `commandExecutionResult` checked before dispatch |
//!
//! Identity writes (sender public keys) are the one exception to (2): they
//! are committed by the account index on their own and survive a revert.

pub mod domain;
pub mod ports;
pub mod processors;
pub mod registry;
pub mod rewards;
pub mod service;

pub use domain::*;
pub use ports::{BlockIndexingApi, IndexOutcome, RevertOutcome};
pub use registry::{DiscoveryReport, Processor, ProcessorFn, ProcessorRegistry};
pub use service::BlockIndexingEngine;
