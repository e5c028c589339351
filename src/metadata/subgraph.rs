//! Optional subgraph lookup for registry items
//!
//! When a dispute's item can be recovered but its market address cannot (the
//! original submission fell outside the retained correlation window), the
//! registry subgraph can be queried by item ID. The first keyed column of a
//! registry item (`key0`) holds the market address. The endpoint is optional;
//! absence or failure degrades the notification, nothing more.

use alloy_primitives::{Address, B256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ITEM_QUERY: &str = r#"query ($id: String!) {
  litems(where: { itemID: $id }, first: 1) {
    itemID
    key0
  }
}"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: String,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ItemData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ItemData {
    litems: Vec<RegistryItem>,
}

#[derive(Debug, Deserialize)]
struct RegistryItem {
    key0: Option<String>,
}

/// GraphQL client for the registry subgraph
#[derive(Debug, Clone)]
pub struct SubgraphClient {
    client: Client,
    endpoint: String,
}

impl SubgraphClient {
    /// Create a new subgraph client with a bounded request timeout
    pub fn new(endpoint: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }

    /// Look up the market address recorded for an item, if any
    pub async fn market_address_for_item(&self, item_id: B256) -> eyre::Result<Option<Address>> {
        let request = GraphQlRequest {
            query: ITEM_QUERY.to_string(),
            variables: serde_json::json!({ "id": item_id.to_string() }),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            eyre::bail!("Subgraph query failed: HTTP {}", response.status());
        }

        let body: GraphQlResponse = response.json().await?;

        if let Some(errors) = body.errors {
            if let Some(first) = errors.first() {
                eyre::bail!("Subgraph query error: {}", first.message);
            }
        }

        let address = body
            .data
            .and_then(|d| d.litems.into_iter().next())
            .and_then(|item| item.key0)
            .and_then(|key| key.trim().parse::<Address>().ok());

        Ok(address)
    }
}
