//! Market contract client for display-name lookups
//!
//! Resolved market addresses point at prediction-market contracts exposing a
//! read-only `marketName()`. The name is display metadata only: a failed
//! call degrades the notification, it never blocks it.

use crate::chain::errors::ChainError;
use alloy::providers::ProviderBuilder;
use alloy::transports::http::reqwest::Url;
use alloy_primitives::Address;
use alloy::sol;

sol! {
    /// Minimal market interface: the human-readable question
    #[sol(rpc)]
    interface IMarketView {
        function marketName() external view returns (string);
    }
}

/// Read-only client for market display metadata
#[derive(Debug, Clone)]
pub struct MarketClient {
    rpc_url: String,
}

impl MarketClient {
    /// Create a new market client against the given RPC URL
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }

    /// Call `marketName()` on the given market contract.
    ///
    /// An empty name is reported as such; the caller decides whether to
    /// treat it as unresolved.
    pub async fn market_name(&self, market: Address) -> Result<String, ChainError> {
        let url: Url = self.rpc_url.parse().map_err(|_| {
            ChainError::InvalidConfig(format!("Invalid RPC URL: {}", self.rpc_url))
        })?;

        let provider = ProviderBuilder::new().connect_http(url);
        let view = IMarketView::new(market, &provider);

        let name = view
            .marketName()
            .call()
            .await
            .map_err(|e| ChainError::CallFailed(format!("marketName failed for {}: {}", market, e)))?;

        Ok(name)
    }
}
