//! Content-gateway client for item documents
//!
//! Registry items embed a content-addressed pointer to a JSON document.
//! The document shape is not ours to define, so it is fetched as
//! loosely-typed JSON and fields are extracted individually by the resolver.

use reqwest::Client;
use std::time::Duration;

/// HTTP client for a content-addressed gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client with a bounded request timeout
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Build the gateway URL for a content pointer.
    ///
    /// Accepts both `/ipfs/Qm...` paths and `ipfs://Qm...` URIs.
    fn document_url(&self, pointer: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = match pointer.strip_prefix("ipfs://") {
            Some(rest) => format!("/ipfs/{}", rest.trim_start_matches('/')),
            None if pointer.starts_with('/') => pointer.to_string(),
            None => format!("/{}", pointer),
        };
        format!("{}{}", base, path)
    }

    /// Fetch the document behind a content pointer and parse it as JSON
    pub async fn fetch_json(&self, pointer: &str) -> eyre::Result<serde_json::Value> {
        let url = self.document_url(pointer);

        tracing::debug!(%url, "Fetching item document");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            eyre::bail!("Document fetch failed: HTTP {}", response.status());
        }

        let document: serde_json::Value = response.json().await?;

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url_ipfs_path() {
        let client = GatewayClient::new("https://gateway.example.com/".to_string(), 10);
        assert_eq!(
            client.document_url("/ipfs/QmAbc/item.json"),
            "https://gateway.example.com/ipfs/QmAbc/item.json"
        );
    }

    #[test]
    fn test_document_url_ipfs_uri() {
        let client = GatewayClient::new("https://gateway.example.com".to_string(), 10);
        assert_eq!(
            client.document_url("ipfs://QmAbc/item.json"),
            "https://gateway.example.com/ipfs/QmAbc/item.json"
        );
    }

    #[test]
    fn test_document_url_bare_path() {
        let client = GatewayClient::new("https://gateway.example.com".to_string(), 10);
        assert_eq!(
            client.document_url("ipfs/QmAbc/item.json"),
            "https://gateway.example.com/ipfs/QmAbc/item.json"
        );
    }
}
