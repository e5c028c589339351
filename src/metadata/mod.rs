//! Metadata resolution for registry items
//!
//! A notification is assembled from three independently unreliable sources:
//! the content gateway (item document → market address), the chain RPC
//! (market address → display name), and the optional registry subgraph
//! (item ID → market address, when the document path is unavailable). Each
//! source is optional-on-failure: an outage degrades the notification's
//! richness, never its delivery.

mod gateway;
mod subgraph;

pub use gateway::GatewayClient;
pub use subgraph::SubgraphClient;

use crate::chain::MarketClient;
use alloy_primitives::{Address, B256};

/// Market metadata resolved for an item. Either field may remain
/// unresolved; absence is a valid terminal state, not an error.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMarket {
    /// Registry key of the item, when known
    pub item_id: Option<B256>,
    /// Address of the market contract the item describes
    pub market_address: Option<Address>,
    /// Human-readable market name from the contract
    pub market_name: Option<String>,
}

/// Resolves market metadata for registry events
pub struct MetadataResolver {
    gateway: GatewayClient,
    market_client: MarketClient,
    subgraph: Option<SubgraphClient>,
}

impl MetadataResolver {
    /// Create a new resolver. The subgraph endpoint is optional.
    pub fn new(
        gateway: GatewayClient,
        market_client: MarketClient,
        subgraph: Option<SubgraphClient>,
    ) -> Self {
        Self {
            gateway,
            market_client,
            subgraph,
        }
    }

    /// Resolve metadata for a submission: fetch the item document from the
    /// gateway, extract the market address, then look up its display name.
    pub async fn resolve_submission(&self, item_id: B256, pointer: &str) -> ResolvedMarket {
        let market_address = match self.gateway.fetch_json(pointer).await {
            Ok(document) => {
                let address = extract_market_address(&document);
                if address.is_none() {
                    tracing::warn!(item = %item_id, "Item document has no market address");
                }
                address
            }
            Err(e) => {
                tracing::warn!(item = %item_id, error = %e, "Item document fetch failed");
                None
            }
        };

        let market_name = match market_address {
            Some(address) => self.name_for(address).await,
            None => None,
        };

        ResolvedMarket {
            item_id: Some(item_id),
            market_address,
            market_name,
        }
    }

    /// Resolve metadata for an item without a document pointer (requests and
    /// correlated disputes): the subgraph supplies the address, if configured.
    pub async fn resolve_item(&self, item_id: Option<B256>) -> ResolvedMarket {
        let market_address = match (item_id, self.subgraph.as_ref()) {
            (Some(id), Some(subgraph)) => match subgraph.market_address_for_item(id).await {
                Ok(address) => address,
                Err(e) => {
                    tracing::warn!(item = %id, error = %e, "Subgraph lookup failed");
                    None
                }
            },
            _ => None,
        };

        let market_name = match market_address {
            Some(address) => self.name_for(address).await,
            None => None,
        };

        ResolvedMarket {
            item_id,
            market_address,
            market_name,
        }
    }

    async fn name_for(&self, address: Address) -> Option<String> {
        match self.market_client.market_name(address).await {
            Ok(name) if !name.trim().is_empty() => Some(name),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(market = %address, error = %e, "Market name lookup failed");
                None
            }
        }
    }
}

/// Extract the market contract address from a loosely-typed item document.
///
/// Documents are not schema-validated: a top-level `marketAddress` field is
/// preferred, then the `Market` column under `values`, then any
/// address-shaped value under `values`.
pub fn extract_market_address(document: &serde_json::Value) -> Option<Address> {
    if let Some(address) = parse_address_field(document.get("marketAddress")) {
        return Some(address);
    }

    let values = document.get("values")?.as_object()?;

    if let Some(address) = parse_address_field(values.get("Market")) {
        return Some(address);
    }

    values
        .values()
        .find_map(|value| parse_address_field(Some(value)))
}

fn parse_address_field(value: Option<&serde_json::Value>) -> Option<Address> {
    value?.as_str()?.trim().parse::<Address>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MARKET: &str = "0x1111111111111111111111111111111111111111";

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_extract_top_level_market_address() {
        let document = json!({ "marketAddress": MARKET });
        assert_eq!(extract_market_address(&document), Some(addr(MARKET)));
    }

    #[test]
    fn test_extract_market_column() {
        let document = json!({
            "columns": [{ "label": "Market" }],
            "values": { "Market": MARKET, "Images": "/ipfs/QmPics" }
        });
        assert_eq!(extract_market_address(&document), Some(addr(MARKET)));
    }

    #[test]
    fn test_extract_falls_back_to_any_address_shaped_value() {
        let document = json!({
            "values": { "Contract": MARKET, "Title": "Will X happen?" }
        });
        assert_eq!(extract_market_address(&document), Some(addr(MARKET)));
    }

    #[test]
    fn test_extract_absent_field_is_none() {
        let document = json!({ "values": { "Title": "Will X happen?" } });
        assert_eq!(extract_market_address(&document), None);
    }

    #[test]
    fn test_extract_malformed_address_is_none() {
        let document = json!({ "marketAddress": "0x1234" });
        assert_eq!(extract_market_address(&document), None);
    }

    #[test]
    fn test_extract_non_object_document_is_none() {
        assert_eq!(extract_market_address(&json!("just a string")), None);
        assert_eq!(extract_market_address(&json!(null)), None);
    }
}
