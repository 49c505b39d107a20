//! Subscription registry for relaysub.
//!
//! This module provides the live store of acknowledged subscriptions
//! together with its topic index, behind a single mutation surface so
//! the two can never drift apart:
//! - every insert records the (topic, id) pair in the index
//! - every removal erases exactly that pair
//!
//! The registry is pure bookkeeping. The client crate decides when to
//! mutate it, persists snapshots of it, and emits lifecycle events from
//! the outcomes these methods return.

use crate::topics::TopicIndex;
use std::collections::BTreeMap;
use sub_types::{ActiveSubscription, SubscriptionId, Topic};

/// Live set of acknowledged subscriptions, keyed by relay-assigned id.
///
/// Two insert flavors cover the two acknowledgement paths:
/// - [`set`](Self::set) is idempotent and reports whether it inserted,
///   for acks that may arrive twice
/// - [`insert`](Self::insert) overwrites unconditionally, for
///   resubscribes that intentionally replace an entry
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscriptionRegistry {
    subscriptions: BTreeMap<SubscriptionId, ActiveSubscription>,
    index: TopicIndex,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `subscription` unless its id is already present.
    ///
    /// Returns `true` if the entry was inserted, `false` if the id was
    /// already known (the existing entry is left untouched).
    pub fn set(&mut self, subscription: ActiveSubscription) -> bool {
        if self.subscriptions.contains_key(&subscription.id) {
            return false;
        }
        self.insert(subscription);
        true
    }

    /// Insert `subscription`, overwriting any entry under the same id.
    ///
    /// The index stays consistent: if the id previously pointed at a
    /// different topic, that stale pair is erased.
    pub fn insert(&mut self, subscription: ActiveSubscription) {
        let id = subscription.id.clone();
        let topic = subscription.topic.clone();
        if let Some(previous) = self.subscriptions.insert(id.clone(), subscription) {
            if previous.topic != topic {
                self.index.remove(&previous.topic, &id);
            }
        }
        self.index.set(topic, id);
    }

    /// Look up a subscription by id.
    pub fn get(&self, id: &SubscriptionId) -> Option<&ActiveSubscription> {
        self.subscriptions.get(id)
    }

    /// Remove and return the subscription under `id`, if any.
    pub fn remove(&mut self, id: &SubscriptionId) -> Option<ActiveSubscription> {
        let subscription = self.subscriptions.remove(id)?;
        self.index.remove(&subscription.topic, id);
        Some(subscription)
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.subscriptions.contains_key(id)
    }

    /// Whether `id` is present and held against `topic`.
    pub fn has(&self, id: &SubscriptionId, topic: &Topic) -> bool {
        self.subscriptions
            .get(id)
            .is_some_and(|subscription| &subscription.topic == topic)
    }

    /// Whether at least one subscription is held against `topic`.
    pub fn contains_topic(&self, topic: &Topic) -> bool {
        self.index.contains_topic(topic)
    }

    /// Every id, ordered.
    pub fn ids(&self) -> Vec<SubscriptionId> {
        self.subscriptions.keys().cloned().collect()
    }

    /// Every subscription record, ordered by id.
    pub fn values(&self) -> Vec<ActiveSubscription> {
        self.subscriptions.values().cloned().collect()
    }

    /// Every topic with at least one subscription, ordered.
    pub fn topics(&self) -> Vec<Topic> {
        self.index.topics()
    }

    /// Every id held against `topic`, ordered.
    pub fn topic_ids(&self, topic: &Topic) -> Vec<SubscriptionId> {
        self.index.get(topic)
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether no subscriptions are held.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Drop every subscription and index entry.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sub_types::RelayProtocol;

    fn sub(id: &str, topic: &str) -> ActiveSubscription {
        ActiveSubscription::new(
            SubscriptionId::new(id),
            Topic::new(topic),
            RelayProtocol::default(),
        )
    }

    #[test]
    fn set_inserts_new_entry() {
        let mut registry = SubscriptionRegistry::new();
        assert!(registry.set(sub("1", "a")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&SubscriptionId::new("1")), Some(&sub("1", "a")));
    }

    #[test]
    fn set_rejects_known_id() {
        let mut registry = SubscriptionRegistry::new();
        assert!(registry.set(sub("1", "a")));
        assert!(!registry.set(sub("1", "a")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn set_keeps_existing_entry_on_duplicate() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        registry.set(sub("1", "b"));
        assert_eq!(registry.get(&SubscriptionId::new("1")).unwrap().topic, Topic::new("a"));
    }

    #[test]
    fn insert_overwrites_known_id() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        registry.insert(sub("1", "b"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&SubscriptionId::new("1")).unwrap().topic, Topic::new("b"));
    }

    #[test]
    fn insert_overwrite_erases_stale_index_pair() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        registry.insert(sub("1", "b"));
        assert!(registry.topic_ids(&Topic::new("a")).is_empty());
        assert_eq!(registry.topic_ids(&Topic::new("b")), vec![SubscriptionId::new("1")]);
    }

    #[test]
    fn remove_returns_the_entry_and_cleans_index() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        let removed = registry.remove(&SubscriptionId::new("1"));
        assert_eq!(removed, Some(sub("1", "a")));
        assert!(registry.is_empty());
        assert!(!registry.contains_topic(&Topic::new("a")));
    }

    #[test]
    fn remove_unknown_id_returns_none() {
        let mut registry = SubscriptionRegistry::new();
        assert_eq!(registry.remove(&SubscriptionId::new("missing")), None);
    }

    #[test]
    fn has_requires_matching_topic() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        assert!(registry.has(&SubscriptionId::new("1"), &Topic::new("a")));
        assert!(!registry.has(&SubscriptionId::new("1"), &Topic::new("b")));
        assert!(!registry.has(&SubscriptionId::new("2"), &Topic::new("a")));
    }

    #[test]
    fn topic_may_hold_multiple_ids() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        registry.set(sub("2", "a"));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.topic_ids(&Topic::new("a")),
            vec![SubscriptionId::new("1"), SubscriptionId::new("2")]
        );
    }

    #[test]
    fn removing_one_id_keeps_topic_siblings() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        registry.set(sub("2", "a"));
        registry.remove(&SubscriptionId::new("1"));
        assert!(registry.contains_topic(&Topic::new("a")));
        assert_eq!(registry.topic_ids(&Topic::new("a")), vec![SubscriptionId::new("2")]);
    }

    #[test]
    fn views_are_ordered() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("2", "b"));
        registry.set(sub("1", "a"));
        assert_eq!(registry.ids(), vec![SubscriptionId::new("1"), SubscriptionId::new("2")]);
        assert_eq!(registry.values(), vec![sub("1", "a"), sub("2", "b")]);
        assert_eq!(registry.topics(), vec![Topic::new("a"), Topic::new("b")]);
    }

    #[test]
    fn clear_empties_store_and_index() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        registry.set(sub("2", "b"));
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.topics().is_empty());
    }

    #[test]
    fn index_matches_store_after_mixed_operations() {
        let mut registry = SubscriptionRegistry::new();
        registry.set(sub("1", "a"));
        registry.set(sub("2", "a"));
        registry.set(sub("3", "b"));
        registry.remove(&SubscriptionId::new("2"));
        registry.insert(sub("3", "c"));
        registry.set(sub("4", "b"));

        // every stored entry is indexed under its topic
        for subscription in registry.values() {
            assert!(registry
                .topic_ids(&subscription.topic)
                .contains(&subscription.id));
        }
        // every indexed pair points at a stored entry with that topic
        for topic in registry.topics() {
            for id in registry.topic_ids(&topic) {
                assert!(registry.has(&id, &topic));
            }
        }
    }
}
