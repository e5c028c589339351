//! Event types for registry contract events
//!
//! The light-TCR registry emits three event kinds the watcher cares about:
//! - NewItem: an item was submitted, carrying its off-chain document pointer
//! - RequestSubmitted: a registration/removal request was opened for an item
//! - Dispute: a request was challenged and sent to the arbitrator
//!
//! Anything else the contract emits is skipped.

use alloy_primitives::{Address, Log as PrimitiveLog, B256, U256};
use alloy_sol_types::{sol, SolEvent};

// Define registry events using alloy-sol-types.
// NewItem and RequestSubmitted index the item ID; Dispute follows the
// standard evidence interface and carries no item ID at all.
sol! {
    /// Emitted when an item is first submitted to the registry.
    /// `_data` points at the item's JSON document on IPFS.
    #[derive(Debug)]
    event NewItem(bytes32 indexed _itemID, string _data, bool _addedDirectly);

    /// Emitted when a registration or removal request is opened for an item.
    #[derive(Debug)]
    event RequestSubmitted(bytes32 indexed _itemID, uint256 _evidenceGroupID);

    /// Emitted when a request is challenged and a dispute is created on the
    /// arbitrator.
    #[derive(Debug)]
    event Dispute(
        address indexed _arbitrator,
        uint256 indexed _disputeID,
        uint256 _metaEvidenceID,
        uint256 _evidenceGroupID
    );
}

/// Parsed NewItem event with additional context
#[derive(Debug, Clone)]
pub struct NewItemEvent {
    /// Registry key of the submitted item
    pub item_id: B256,
    /// Content pointer to the item's JSON document (e.g. `/ipfs/Qm.../item.json`)
    pub data: String,
    /// Whether the item skipped the request flow
    pub added_directly: bool,
    /// Transaction hash for correlation
    pub tx_hash: B256,
    /// Block number when the event was emitted
    pub block_number: u64,
    /// Position of the log within its block
    pub log_index: u64,
}

/// Parsed RequestSubmitted event with additional context
#[derive(Debug, Clone)]
pub struct RequestSubmittedEvent {
    /// Registry key of the item the request targets
    pub item_id: B256,
    /// Evidence group linking later disputes back to this request
    pub evidence_group_id: U256,
    /// Transaction hash for correlation
    pub tx_hash: B256,
    /// Block number when the event was emitted
    pub block_number: u64,
    /// Position of the log within its block
    pub log_index: u64,
}

/// Parsed Dispute event with additional context.
/// Carries no item ID; correlation recovers it from the evidence group
/// or the transaction.
#[derive(Debug, Clone)]
pub struct DisputeEvent {
    /// Arbitrator contract the dispute was raised on
    pub arbitrator: Address,
    /// Dispute identifier on the arbitrator
    pub dispute_id: U256,
    /// Evidence group shared with the originating request
    pub evidence_group_id: U256,
    /// Transaction hash for correlation
    pub tx_hash: B256,
    /// Block number when the event was emitted
    pub block_number: u64,
    /// Position of the log within its block
    pub log_index: u64,
}

/// Wrapper enum for registry events
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    NewItem(NewItemEvent),
    RequestSubmitted(RequestSubmittedEvent),
    Dispute(DisputeEvent),
}

impl RegistryEvent {
    /// Get the transaction hash from the event
    pub fn tx_hash(&self) -> B256 {
        match self {
            RegistryEvent::NewItem(e) => e.tx_hash,
            RegistryEvent::RequestSubmitted(e) => e.tx_hash,
            RegistryEvent::Dispute(e) => e.tx_hash,
        }
    }

    /// Get the block number from the event
    pub fn block_number(&self) -> u64 {
        match self {
            RegistryEvent::NewItem(e) => e.block_number,
            RegistryEvent::RequestSubmitted(e) => e.block_number,
            RegistryEvent::Dispute(e) => e.block_number,
        }
    }

    /// Get the item ID from the event.
    /// Returns None for disputes, which carry no item ID.
    pub fn item_id(&self) -> Option<B256> {
        match self {
            RegistryEvent::NewItem(e) => Some(e.item_id),
            RegistryEvent::RequestSubmitted(e) => Some(e.item_id),
            RegistryEvent::Dispute(_) => None,
        }
    }

    /// Human-readable event kind for logging
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEvent::NewItem(_) => "NewItem",
            RegistryEvent::RequestSubmitted(_) => "RequestSubmitted",
            RegistryEvent::Dispute(_) => "Dispute",
        }
    }

    /// Check if this is a dispute event
    pub fn is_dispute(&self) -> bool {
        matches!(self, RegistryEvent::Dispute(_))
    }
}

/// Event signature constants
pub struct EventSignatures;

impl EventSignatures {
    /// NewItem event signature (topic0)
    pub fn new_item() -> B256 {
        NewItem::SIGNATURE_HASH
    }

    /// RequestSubmitted event signature (topic0)
    pub fn request_submitted() -> B256 {
        RequestSubmitted::SIGNATURE_HASH
    }

    /// Dispute event signature (topic0)
    pub fn dispute() -> B256 {
        Dispute::SIGNATURE_HASH
    }

    /// Get all 3 event signatures as a vector (for filtering)
    pub fn all() -> Vec<B256> {
        vec![
            Self::new_item(),
            Self::request_submitted(),
            Self::dispute(),
        ]
    }
}

/// Parse a raw log into a RegistryEvent.
///
/// Returns `Ok(None)` for logs whose leading topic matches none of the three
/// known signatures. A recognized signature with malformed topics or data is
/// a `DecodeError`; the caller logs and skips the entry without aborting the
/// batch.
pub fn decode_log(
    log: &PrimitiveLog,
    tx_hash: B256,
    block_number: u64,
    log_index: u64,
) -> Result<Option<RegistryEvent>, DecodeError> {
    let topic0 = match log.topics().first() {
        Some(t) => *t,
        None => return Ok(None),
    };

    if topic0 == EventSignatures::new_item() {
        let decoded = NewItem::decode_log(log).map_err(|e| DecodeError {
            event: "NewItem",
            reason: e.to_string(),
        })?;

        Ok(Some(RegistryEvent::NewItem(NewItemEvent {
            item_id: decoded.data._itemID,
            data: decoded.data._data.clone(),
            added_directly: decoded.data._addedDirectly,
            tx_hash,
            block_number,
            log_index,
        })))
    } else if topic0 == EventSignatures::request_submitted() {
        let decoded = RequestSubmitted::decode_log(log).map_err(|e| DecodeError {
            event: "RequestSubmitted",
            reason: e.to_string(),
        })?;

        Ok(Some(RegistryEvent::RequestSubmitted(RequestSubmittedEvent {
            item_id: decoded.data._itemID,
            evidence_group_id: decoded.data._evidenceGroupID,
            tx_hash,
            block_number,
            log_index,
        })))
    } else if topic0 == EventSignatures::dispute() {
        let decoded = Dispute::decode_log(log).map_err(|e| DecodeError {
            event: "Dispute",
            reason: e.to_string(),
        })?;

        Ok(Some(RegistryEvent::Dispute(DisputeEvent {
            arbitrator: decoded.data._arbitrator,
            dispute_id: decoded.data._disputeID,
            evidence_group_id: decoded.data._evidenceGroupID,
            tx_hash,
            block_number,
            log_index,
        })))
    } else {
        Ok(None)
    }
}

/// A recognized event whose topics or data could not be decoded
#[derive(Debug, Clone)]
pub struct DecodeError {
    /// Name of the event that failed to decode
    pub event: &'static str,
    /// Decoder error message
    pub reason: String,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to decode {} event: {}", self.event, self.reason)
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, LogData};

    fn log_for(data: LogData) -> PrimitiveLog {
        PrimitiveLog {
            address: Address::repeat_byte(0x5a),
            data,
        }
    }

    #[test]
    fn test_event_signatures_are_distinct() {
        let sigs = EventSignatures::all();
        assert_eq!(sigs.len(), 3);
        for (i, a) in sigs.iter().enumerate() {
            assert_ne!(*a, B256::ZERO);
            for (j, b) in sigs.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_decode_new_item() {
        let event = NewItem {
            _itemID: B256::repeat_byte(0x11),
            _data: "/ipfs/QmExample/item.json".to_string(),
            _addedDirectly: false,
        };
        let log = log_for(event.encode_log_data());

        let decoded = decode_log(&log, B256::repeat_byte(0xaa), 42, 3)
            .unwrap()
            .unwrap();

        match decoded {
            RegistryEvent::NewItem(e) => {
                assert_eq!(e.item_id, B256::repeat_byte(0x11));
                assert_eq!(e.data, "/ipfs/QmExample/item.json");
                assert!(!e.added_directly);
                assert_eq!(e.tx_hash, B256::repeat_byte(0xaa));
                assert_eq!(e.block_number, 42);
                assert_eq!(e.log_index, 3);
            }
            other => panic!("expected NewItem, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_request_submitted() {
        let event = RequestSubmitted {
            _itemID: B256::repeat_byte(0x22),
            _evidenceGroupID: U256::from(7u64),
        };
        let log = log_for(event.encode_log_data());

        let decoded = decode_log(&log, B256::repeat_byte(0xbb), 100, 0)
            .unwrap()
            .unwrap();

        match decoded {
            RegistryEvent::RequestSubmitted(e) => {
                assert_eq!(e.item_id, B256::repeat_byte(0x22));
                assert_eq!(e.evidence_group_id, U256::from(7u64));
            }
            other => panic!("expected RequestSubmitted, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_dispute_has_no_item_id() {
        let event = Dispute {
            _arbitrator: Address::repeat_byte(0x33),
            _disputeID: U256::from(12u64),
            _metaEvidenceID: U256::ZERO,
            _evidenceGroupID: U256::from(7u64),
        };
        let log = log_for(event.encode_log_data());

        let decoded = decode_log(&log, B256::repeat_byte(0xcc), 101, 1)
            .unwrap()
            .unwrap();

        assert!(decoded.is_dispute());
        assert_eq!(decoded.item_id(), None);
        match decoded {
            RegistryEvent::Dispute(e) => {
                assert_eq!(e.dispute_id, U256::from(12u64));
                assert_eq!(e.evidence_group_id, U256::from(7u64));
                assert_eq!(e.arbitrator, Address::repeat_byte(0x33));
            }
            other => panic!("expected Dispute, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_signature_is_skipped_silently() {
        let data = LogData::new_unchecked(vec![B256::repeat_byte(0xfe)], Bytes::new());
        let log = log_for(data);

        let decoded = decode_log(&log, B256::ZERO, 1, 0).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_no_topics_is_skipped_silently() {
        let data = LogData::new_unchecked(vec![], Bytes::new());
        let log = log_for(data);

        let decoded = decode_log(&log, B256::ZERO, 1, 0).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_malformed_recognized_event_is_an_error() {
        // NewItem signature but no indexed item ID topic and empty data
        let data = LogData::new_unchecked(vec![EventSignatures::new_item()], Bytes::new());
        let log = log_for(data);

        let result = decode_log(&log, B256::ZERO, 1, 0);
        let err = result.unwrap_err();
        assert_eq!(err.event, "NewItem");
        assert!(err.to_string().contains("NewItem"));
    }
}
