//! # Index Store Subsystem (ix-02)
//!
//! Ordered key-value storage for every derived table: accounts, validators,
//! commission history, stakes, subscriptions, the account retry queue and
//! the indexed-block markers.
//!
//! ## Write Path
//!
//! ```text
//! Engine ──begin──→ UnitOfWork (overlay) ──commit──→ KeyValueStore::atomic_batch_write
//!                        │
//!                        └──drop/abort──→ nothing reaches the store
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | One commission entry per (address, height) | Entry key is `address ++ height` |
//! | 2 | Block writes are all-or-nothing | `UnitOfWork::commit` is one batch |
//! | 3 | No zero-amount stake rows | `IndexWriter::set_stake` deletes on 0 |
//! | 4 | Empty accounts leave no trace | Account fields stored per key; `isValidator=false` is absence |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): errors, key layout, stored-only entities
//! - **Ports Layer** (`ports/`): `KeyValueStore` and the in-memory adapter
//! - **Tables** (`tables.rs`): typed read/write extension traits
//! - **Unit of Work** (`unit_of_work.rs`): per-block atomic overlay

pub mod domain;
pub mod ports;
pub mod tables;
pub mod unit_of_work;

pub use domain::{keys, RetryEntry, StoreError};
pub use ports::{BatchOperation, InMemoryKVStore, KeyValueStore};
pub use tables::{IndexReader, IndexWriter, KvRead, KvWrite};
pub use unit_of_work::UnitOfWork;
