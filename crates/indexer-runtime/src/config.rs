//! # Indexer Configuration
//!
//! Loaded from an optional TOML file, then environment overrides, then
//! validated. Every section has working defaults for a local node.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete indexer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Node connection.
    pub node: NodeConfig,
    /// Index database.
    pub storage: StorageConfig,
    /// Background worker cadence.
    pub workers: WorkerConfig,
    /// Cross-chain settings.
    pub chain: ChainConfig,
}

/// Node connection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC over HTTP endpoint
    pub rpc_url: String,
    /// WebSocket subscription endpoint
    pub ws_url: String,
    /// Bound on every node and remote call
    pub rpc_timeout_ms: u64,
    /// Attempts for a critical-path block fetch before halting
    pub fetch_retries: u32,
    /// Fixed delay between block fetch attempts
    pub fetch_backoff_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:7887/rpc".to_string(),
            ws_url: "ws://127.0.0.1:7887/rpc-ws".to_string(),
            rpc_timeout_ms: 5_000,
            fetch_retries: 3,
            fetch_backoff_ms: 500,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// RocksDB directory
    pub data_dir: PathBuf,
    /// fsync every write batch
    pub sync_writes: bool,
    /// Block cache size in bytes
    pub block_cache_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/index"),
            sync_writes: true,
            block_cache_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Account retry queue drain interval
    pub retry_interval_secs: u64,
    /// Pending pool refresh interval
    pub pending_refresh_interval_secs: u64,
    /// Fallback poll of the node tip when no block events arrive
    pub sync_poll_interval_secs: u64,
    /// First height to index on an empty database
    pub start_height: u64,
    /// Per-subscriber event bus buffer
    pub event_channel_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: 30,
            pending_refresh_interval_secs: 10,
            sync_poll_interval_secs: 10,
            start_height: 0,
            event_channel_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Cross-chain configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Overrides the built-in mainchain service table
    pub mainchain_service_url: Option<String>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl IndexerConfig {
    /// File (if any), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `IX_*` overrides looked up through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("IX_NODE_RPC_URL") {
            self.node.rpc_url = url;
        }
        if let Some(url) = lookup("IX_NODE_WS_URL") {
            self.node.ws_url = url;
        }
        if let Some(dir) = lookup("IX_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("IX_MAINCHAIN_SERVICE_URL") {
            self.chain.mainchain_service_url = Some(url).filter(|u| !u.is_empty());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_scheme("node.rpc_url", &self.node.rpc_url, &["http://", "https://"])?;
        require_scheme("node.ws_url", &self.node.ws_url, &["ws://", "wss://"])?;
        if let Some(url) = &self.chain.mainchain_service_url {
            require_scheme("chain.mainchain_service_url", url, &["http://", "https://"])?;
        }

        non_zero("node.rpc_timeout_ms", self.node.rpc_timeout_ms)?;
        non_zero("node.fetch_retries", u64::from(self.node.fetch_retries))?;
        non_zero("workers.retry_interval_secs", self.workers.retry_interval_secs)?;
        non_zero(
            "workers.pending_refresh_interval_secs",
            self.workers.pending_refresh_interval_secs,
        )?;
        non_zero("workers.sync_poll_interval_secs", self.workers.sync_poll_interval_secs)?;
        non_zero(
            "workers.event_channel_capacity",
            self.workers.event_channel_capacity as u64,
        )?;
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.node.rpc_timeout_ms)
    }

    pub fn fetch_backoff(&self) -> Duration {
        Duration::from_millis(self.node.fetch_backoff_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.workers.retry_interval_secs)
    }

    pub fn pending_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.workers.pending_refresh_interval_secs)
    }

    pub fn sync_poll_interval(&self) -> Duration {
        Duration::from_secs(self.workers.sync_poll_interval_secs)
    }
}

fn require_scheme(field: &'static str, url: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    if schemes.iter().any(|s| url.starts_with(s)) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("'{}' must start with one of {:?}", url, schemes),
        })
    }
}

fn non_zero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "cannot be 0".into(),
        });
    }
    Ok(())
}
