//! Correlation and deduplication of registry events
//!
//! Events are grouped into logical occurrences by notification key: the
//! transaction hash for submissions and requests (a transaction emitting
//! both NewItem and RequestSubmitted is one occurrence), the dispute ID for
//! disputes. Each key notifies at most once per process lifetime.
//!
//! Disputes carry no item ID, so the correlator also retains a bounded
//! index of item associations (evidence group → item, transaction → item)
//! across polling cycles. An association evicted or never seen leaves the
//! dispute uncorrelated, which degrades its notification rather than
//! dropping it.

use crate::chain::{DisputeEvent, RegistryEvent};
use alloy_primitives::{B256, U256};
use std::collections::{HashMap, HashSet, VecDeque};

/// Default capacity of the cross-cycle item association index
pub const DEFAULT_INDEX_CAPACITY: usize = 4096;

/// Deduplication key for a logical occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationKey {
    /// Submissions and requests dedup by transaction
    Transaction(B256),
    /// Disputes dedup by dispute ID
    Dispute(U256),
}

/// Compute the notification key for an event
pub fn notification_key(event: &RegistryEvent) -> NotificationKey {
    match event {
        RegistryEvent::Dispute(d) => NotificationKey::Dispute(d.dispute_id),
        other => NotificationKey::Transaction(other.tx_hash()),
    }
}

/// How an item association was keyed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum AssocKey {
    EvidenceGroup(U256),
    Transaction(B256),
}

/// Insertion-order map with a capacity bound; oldest entries are evicted
/// first once the bound is reached.
#[derive(Debug)]
struct BoundedIndex {
    capacity: usize,
    map: HashMap<AssocKey, B256>,
    order: VecDeque<AssocKey>,
}

impl BoundedIndex {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, key: AssocKey, item_id: B256) {
        if self.map.insert(key.clone(), item_id).is_none() {
            self.order.push_back(key);
            while self.order.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.map.remove(&oldest);
                }
            }
        }
    }

    fn get(&self, key: &AssocKey) -> Option<B256> {
        self.map.get(key).copied()
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// One logical occurrence extracted from a batch of events
#[derive(Debug)]
pub struct EventGroup {
    /// Deduplication key for the occurrence
    pub key: NotificationKey,
    /// The event chosen to represent the occurrence
    pub representative: RegistryEvent,
}

/// Correlation engine: groups events, tracks delivered keys, and maps
/// disputes back to their originating item.
#[derive(Debug)]
pub struct Correlator {
    seen: HashSet<NotificationKey>,
    items: BoundedIndex,
}

impl Correlator {
    /// Create a correlator with the default association capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INDEX_CAPACITY)
    }

    /// Create a correlator retaining at most `capacity` item associations
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            items: BoundedIndex::new(capacity),
        }
    }

    /// Record item associations from a batch of decoded events.
    ///
    /// Called before dispute correlation so a dispute landing in the same
    /// batch as its originating request still resolves.
    pub fn record_associations(&mut self, events: &[RegistryEvent]) {
        for event in events {
            match event {
                RegistryEvent::NewItem(e) => {
                    self.items
                        .insert(AssocKey::Transaction(e.tx_hash), e.item_id);
                }
                RegistryEvent::RequestSubmitted(e) => {
                    self.items
                        .insert(AssocKey::Transaction(e.tx_hash), e.item_id);
                    self.items
                        .insert(AssocKey::EvidenceGroup(e.evidence_group_id), e.item_id);
                }
                RegistryEvent::Dispute(_) => {}
            }
        }
    }

    /// Group a batch of events into logical occurrences, preserving arrival
    /// order. Events in the same transaction collapse into one group; the
    /// NewItem event is preferred as representative since it carries the
    /// document pointer.
    pub fn group(events: Vec<RegistryEvent>) -> Vec<EventGroup> {
        let mut groups: Vec<EventGroup> = Vec::new();
        let mut positions: HashMap<NotificationKey, usize> = HashMap::new();

        for event in events {
            let key = notification_key(&event);
            match positions.get(&key) {
                Some(&at) => {
                    let richer = matches!(
                        (&groups[at].representative, &event),
                        (RegistryEvent::RequestSubmitted(_), RegistryEvent::NewItem(_))
                    );
                    if richer {
                        groups[at].representative = event;
                    }
                }
                None => {
                    positions.insert(key.clone(), groups.len());
                    groups.push(EventGroup {
                        key,
                        representative: event,
                    });
                }
            }
        }

        groups
    }

    /// Check whether a key already produced a notification this run
    pub fn is_seen(&self, key: &NotificationKey) -> bool {
        self.seen.contains(key)
    }

    /// Mark a key as notified. Returns false if it was already marked.
    pub fn mark_seen(&mut self, key: NotificationKey) -> bool {
        self.seen.insert(key)
    }

    /// Number of keys notified this run
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Number of retained item associations
    pub fn association_count(&self) -> usize {
        self.items.len()
    }

    /// Recover the item a dispute originates from, by evidence group first
    /// and then by shared transaction. Returns `None` when the origin falls
    /// outside the retained window.
    pub fn item_for_dispute(&self, dispute: &DisputeEvent) -> Option<B256> {
        self.items
            .get(&AssocKey::EvidenceGroup(dispute.evidence_group_id))
            .or_else(|| self.items.get(&AssocKey::Transaction(dispute.tx_hash)))
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{NewItemEvent, RequestSubmittedEvent};

    fn new_item(item: u8, tx: u8, block: u64) -> RegistryEvent {
        RegistryEvent::NewItem(NewItemEvent {
            item_id: B256::repeat_byte(item),
            data: "/ipfs/QmExample/item.json".to_string(),
            added_directly: false,
            tx_hash: B256::repeat_byte(tx),
            block_number: block,
            log_index: 0,
        })
    }

    fn request(item: u8, tx: u8, evidence_group: u64, block: u64) -> RegistryEvent {
        RegistryEvent::RequestSubmitted(RequestSubmittedEvent {
            item_id: B256::repeat_byte(item),
            evidence_group_id: U256::from(evidence_group),
            tx_hash: B256::repeat_byte(tx),
            block_number: block,
            log_index: 1,
        })
    }

    fn dispute(dispute_id: u64, tx: u8, evidence_group: u64, block: u64) -> DisputeEvent {
        DisputeEvent {
            arbitrator: alloy_primitives::Address::repeat_byte(0x99),
            dispute_id: U256::from(dispute_id),
            evidence_group_id: U256::from(evidence_group),
            tx_hash: B256::repeat_byte(tx),
            block_number: block,
            log_index: 2,
        }
    }

    #[test]
    fn test_same_transaction_collapses_to_one_group() {
        let events = vec![new_item(0x11, 0xaa, 10), request(0x11, 0xaa, 7, 10)];
        let groups = Correlator::group(events);

        assert_eq!(groups.len(), 1);
        assert!(matches!(groups[0].representative, RegistryEvent::NewItem(_)));
    }

    #[test]
    fn test_request_first_still_prefers_new_item() {
        let events = vec![request(0x11, 0xaa, 7, 10), new_item(0x11, 0xaa, 10)];
        let groups = Correlator::group(events);

        assert_eq!(groups.len(), 1);
        assert!(matches!(groups[0].representative, RegistryEvent::NewItem(_)));
    }

    #[test]
    fn test_distinct_transactions_stay_separate_in_order() {
        let events = vec![new_item(0x11, 0xaa, 10), new_item(0x22, 0xbb, 11)];
        let groups = Correlator::group(events);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].representative.block_number(), 10);
        assert_eq!(groups[1].representative.block_number(), 11);
    }

    #[test]
    fn test_dispute_groups_by_dispute_id_not_tx() {
        // A challenge transaction can also emit a request for the same item
        let d = dispute(5, 0xaa, 7, 10);
        let events = vec![request(0x11, 0xaa, 7, 10), RegistryEvent::Dispute(d)];
        let groups = Correlator::group(events);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].key, NotificationKey::Dispute(U256::from(5u64)));
    }

    #[test]
    fn test_mark_seen_is_idempotent() {
        let mut correlator = Correlator::new();
        let key = NotificationKey::Transaction(B256::repeat_byte(0xaa));

        assert!(!correlator.is_seen(&key));
        assert!(correlator.mark_seen(key.clone()));
        assert!(correlator.is_seen(&key));
        assert!(!correlator.mark_seen(key));
        assert_eq!(correlator.seen_count(), 1);
    }

    #[test]
    fn test_dispute_correlates_by_evidence_group_across_cycles() {
        let mut correlator = Correlator::new();

        // Cycle 1: the request is seen
        correlator.record_associations(&[request(0x11, 0xaa, 7, 10)]);

        // Cycle 2: the dispute arrives in a different transaction
        let d = dispute(5, 0xcc, 7, 50);
        assert_eq!(correlator.item_for_dispute(&d), Some(B256::repeat_byte(0x11)));
    }

    #[test]
    fn test_dispute_correlates_by_shared_transaction() {
        let mut correlator = Correlator::new();

        correlator.record_associations(&[new_item(0x22, 0xbb, 10)]);

        // Evidence group unknown, but the dispute shares the submission tx
        let d = dispute(6, 0xbb, 99, 10);
        assert_eq!(correlator.item_for_dispute(&d), Some(B256::repeat_byte(0x22)));
    }

    #[test]
    fn test_uncorrelated_dispute_is_none() {
        let correlator = Correlator::new();
        let d = dispute(7, 0xdd, 123, 10);
        assert_eq!(correlator.item_for_dispute(&d), None);
    }

    #[test]
    fn test_association_index_evicts_oldest() {
        let mut correlator = Correlator::with_capacity(2);

        correlator.record_associations(&[request(0x11, 0xa1, 1, 10)]);
        correlator.record_associations(&[request(0x22, 0xa2, 2, 11)]);
        correlator.record_associations(&[request(0x33, 0xa3, 3, 12)]);

        // Each request records two associations, so the oldest item's are gone
        let early = dispute(1, 0xe1, 1, 20);
        assert_eq!(correlator.item_for_dispute(&early), None);

        let late = dispute(2, 0xa3, 3, 20);
        assert_eq!(correlator.item_for_dispute(&late), Some(B256::repeat_byte(0x33)));
        assert!(correlator.association_count() <= 2);
    }

    #[test]
    fn test_reinserting_existing_association_does_not_grow_index() {
        let mut correlator = Correlator::with_capacity(4);
        let batch = [request(0x11, 0xa1, 1, 10)];

        correlator.record_associations(&batch);
        correlator.record_associations(&batch);

        assert_eq!(correlator.association_count(), 2);
    }
}
