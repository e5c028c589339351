//! Watcher configuration
//!
//! Loaded from a JSON file, with every section overridable through
//! environment variables. The bot token is deliberately env-only
//! (`TELEGRAM_BOT_TOKEN`) and never part of the file.

use crate::watcher::DEFAULT_CURSOR_PATH;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_RPC_URL: &str = "https://rpc.gnosischain.com";
pub const DEFAULT_REGISTRY_ADDRESS: &str = "0x5aaf9e23a11440f8c1ad6d2e2e5109c7e52cc672";
pub const DEFAULT_CONFIRMATIONS: u64 = 3;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_BATCH_SIZE: u64 = 200;
pub const DEFAULT_GATEWAY_URL: &str = "https://cdn.kleros.link";
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://gnosisscan.io/tx/";
pub const DEFAULT_SEER_MARKET_URL: &str = "https://app.seer.pm/markets/100/";
pub const DEFAULT_CURATE_URL: &str = "https://curate.kleros.io/tcr/100";
pub const DEFAULT_TELEGRAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub chain: ChainConfig,
    pub polling: PollingConfig,
    pub metadata: MetadataConfig,
    pub telegram: TelegramConfig,
    pub cursor_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub registry_address: String,
    pub confirmations: u64,
    pub start_block: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub batch_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub gateway_url: String,
    pub gateway_timeout_secs: u64,
    pub subgraph_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub chat_id: String,
    pub timeout_secs: u64,
    pub explorer_tx_url: String,
    pub seer_market_url: String,
    pub curate_url: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            polling: PollingConfig::default(),
            metadata: MetadataConfig::default(),
            telegram: TelegramConfig::default(),
            cursor_path: DEFAULT_CURSOR_PATH.to_string(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            registry_address: DEFAULT_REGISTRY_ADDRESS.to_string(),
            confirmations: DEFAULT_CONFIRMATIONS,
            start_block: None,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
            subgraph_url: None,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            chat_id: String::new(),
            timeout_secs: DEFAULT_TELEGRAM_TIMEOUT_SECS,
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
            seer_market_url: DEFAULT_SEER_MARKET_URL.to_string(),
            curate_url: DEFAULT_CURATE_URL.to_string(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

impl ChainConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env_string("GNOSIS_RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(address) = env_string("REGISTRY_ADDRESS") {
            self.registry_address = address;
        }
        if let Some(confirmations) = env_parse("CONFIRMATIONS") {
            self.confirmations = confirmations;
        }
        if let Some(start_block) = env_parse("START_BLOCK") {
            self.start_block = Some(start_block);
        }
        self
    }
}

impl PollingConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(interval) = env_parse("POLL_INTERVAL") {
            self.interval_secs = interval;
        }
        if let Some(batch_size) = env_parse("BATCH_SIZE") {
            self.batch_size = batch_size;
        }
        self
    }
}

impl MetadataConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env_string("IPFS_GATEWAY_URL") {
            self.gateway_url = url;
        }
        if let Some(timeout) = env_parse("IPFS_GATEWAY_TIMEOUT") {
            self.gateway_timeout_secs = timeout;
        }
        if let Some(url) = env_string("SUBGRAPH_URL") {
            self.subgraph_url = Some(url);
        }
        self
    }
}

impl TelegramConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(chat_id) = env_string("TELEGRAM_CHAT_ID") {
            self.chat_id = chat_id;
        }
        if let Some(url) = env_string("EXPLORER_TX_URL") {
            self.explorer_tx_url = url;
        }
        self
    }
}

impl WatcherConfig {
    pub async fn load_from_file(path: &Path) -> eyre::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Apply environment overrides to every section
    pub fn with_env_overrides(mut self) -> Self {
        self.chain = self.chain.with_env_overrides();
        self.polling = self.polling.with_env_overrides();
        self.metadata = self.metadata.with_env_overrides();
        self.telegram = self.telegram.with_env_overrides();
        if let Some(path) = env_string("CURSOR_PATH") {
            self.cursor_path = path;
        }
        self
    }

    /// Clamp values that would stall or hammer the node
    pub fn normalized(mut self) -> Self {
        self.polling.interval_secs = self.polling.interval_secs.max(1);
        self.polling.batch_size = self.polling.batch_size.max(1);
        self
    }
}
