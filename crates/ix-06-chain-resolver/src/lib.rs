//! # Chain Resolver Subsystem (ix-06)
//!
//! Knows which chain the local node runs and where channel metadata for a
//! partner chain can be found.
//!
//! ## Channel Routing
//!
//! | Local | Target | Route |
//! |-------|--------|-------|
//! | mainchain | sidechain | local node `getChannel` |
//! | sidechain | mainchain | local node `getChannel` |
//! | sidechain | other sidechain | mainchain service `/invoke` |
//! | any | itself | usage error |
//!
//! A mainchain id is the network byte followed by three zero bytes, so
//! `04000000` is the mainchain of network `04` and `04000001` a sidechain.
//!
//! ## Identity Handle
//!
//! [`ChainContext`] is resolved once at startup and passed to every
//! component that needs the chain id. `refresh` and `invalidate` exist for
//! tests and node restarts.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::MainchainServiceClient;
pub use domain::*;
pub use ports::{ChannelSource, NodeInfoSource};
pub use service::{ChainContext, ChannelResolver};
