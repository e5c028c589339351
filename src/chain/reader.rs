//! Polling log reader for the registry contract
//!
//! Thin client over the chain RPC: fetches the head block number and the
//! registry's event logs for a contiguous block range. Node-side providers
//! cap the width of a single log query, so wide ranges are split into
//! bounded sub-ranges and the merged results re-sorted into block order.

use crate::chain::errors::ChainError;
use crate::chain::events::EventSignatures;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::http::reqwest::Url;
use alloy_primitives::Address;

/// Configuration for the ChainReader
#[derive(Debug, Clone)]
pub struct ChainReaderConfig {
    /// HTTP RPC URL
    pub rpc_url: String,
    /// Address of the registry contract
    pub registry_address: Address,
    /// Maximum width of a single log query
    pub batch_size: u64,
}

/// Polling client for registry logs and the chain head
#[derive(Debug)]
pub struct ChainReader {
    config: ChainReaderConfig,
}

impl ChainReader {
    /// Create a new reader with the given configuration
    pub fn new(config: ChainReaderConfig) -> Self {
        Self { config }
    }

    /// Get the registry address this reader watches
    pub fn registry_address(&self) -> Address {
        self.config.registry_address
    }

    fn parse_rpc_url(&self) -> Result<Url, ChainError> {
        self.config.rpc_url.parse().map_err(|_| {
            ChainError::InvalidConfig(format!("Invalid RPC URL: {}", self.config.rpc_url))
        })
    }

    /// Get the current head block number
    pub async fn head_block(&self) -> Result<u64, ChainError> {
        let provider = ProviderBuilder::new().connect_http(self.parse_rpc_url()?);

        provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get block number: {}", e)))
    }

    /// Fetch registry logs for `[from_block, to_block]` inclusive.
    ///
    /// The range is split into sub-ranges no wider than the configured batch
    /// size; results are merged and sorted by (block number, log index) so
    /// callers see events in emission order regardless of the split. Never
    /// returns entries outside the requested range.
    pub async fn fetch_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, ChainError> {
        if to_block < from_block {
            return Ok(Vec::new());
        }

        let provider = ProviderBuilder::new().connect_http(self.parse_rpc_url()?);

        let mut collected = Vec::new();
        for (sub_from, sub_to) in split_ranges(from_block, to_block, self.config.batch_size) {
            let filter = Filter::new()
                .address(self.config.registry_address)
                .event_signature(EventSignatures::all())
                .from_block(sub_from)
                .to_block(sub_to);

            let logs = provider
                .get_logs(&filter)
                .await
                .map_err(|e| ChainError::RpcError(format!("Failed to get logs: {}", e)))?;

            collected.extend(logs);
        }

        collected.sort_by_key(|log| (log.block_number.unwrap_or(0), log.log_index.unwrap_or(0)));

        Ok(collected)
    }
}

/// Split `[from, to]` inclusive into sub-ranges no wider than `size` blocks.
pub fn split_ranges(from: u64, to: u64, size: u64) -> Vec<(u64, u64)> {
    let size = size.max(1);
    let mut ranges = Vec::new();
    let mut cursor = from;
    while cursor <= to {
        let end = cursor.saturating_add(size - 1).min(to);
        ranges.push((cursor, end));
        if end == u64::MAX {
            break;
        }
        cursor = end + 1;
    }
    ranges
}
