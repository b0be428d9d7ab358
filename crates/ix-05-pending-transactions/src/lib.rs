//! # Pending Transactions Subsystem (ix-05)
//!
//! An in-memory mirror of the node's unconfirmed pool. Each refresh rebuilds
//! the whole mirror and publishes it with one pointer swap, so a query sees
//! either the old pool or the new one.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | Snapshots are never patched in place | `RwLock<Arc<PendingSnapshot>>` swap |
//! | 2 | A failed refresh keeps serving the last pool | `RefreshOutcome::Degraded` |
//! | 3 | Missing sender names never fail a refresh | `SenderDirectory::name_of` returns `Option` |
//! | 4 | `receivingChainID` equal to the local chain selects local transfers | `PendingFilter::matches` |
//! | 5 | `meta.total` counts the filtered set before paging | `Pagination::apply` |

pub mod domain;
pub mod ports;
pub mod service;
pub mod worker;

pub use domain::*;
pub use ports::{SenderDirectory, TransactionPoolSource};
pub use service::{PendingSnapshot, PendingTransactionMirror, RefreshOutcome};
pub use worker::PendingRefresher;
