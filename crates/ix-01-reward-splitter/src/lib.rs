//! # Reward Splitter Subsystem (ix-01)
//!
//! Computes how a block reward divides between the generating validator's
//! commission and the share earned by the validator's own stake.
//!
//! ## Formulas
//!
//! ```text
//! commission        = floor(reward * rate / MAX_COMMISSION)
//! self_stake_reward = floor((reward - commission) * self_stake / total_stake)
//! ```
//!
//! `rate` is the most recent commission recorded strictly below the block
//! height (0 when none). With no stakes on the validator the self-stake
//! reward is 0.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | No floating point | All arithmetic in [`Q96`] over `U256`/`U512` |
//! | 2 | Floor, never round | `Q96::mul`/`Q96::div` truncate |
//! | 3 | No division by zero | `total_stake == 0` short-circuits to 0 |
//! | 4 | Rate lookup below height | `CommissionHistory::commission_before` is strict |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): fixed-point type and pure formulas
//! - **Ports Layer** (`ports/`): history and stake lookups
//! - **Service** (`service.rs`): formulas fed from the ports

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{commission_of, self_stake_share, RewardError, RewardShare, Q96};
pub use ports::{CommissionHistory, StakeLedger};
pub use service::{commission_amount, self_stake_reward, split_reward};
