//! # Adapters
//!
//! - `mainchain_service`: HTTP client for a mainchain's public service

pub mod mainchain_service;

pub use mainchain_service::MainchainServiceClient;
