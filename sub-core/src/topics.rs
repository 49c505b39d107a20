//! Topic index: which subscription ids are currently held per topic.
//!
//! The index is the reverse view of the subscription registry. The relay
//! addresses inbound messages by topic, so lookups in that direction have
//! to be cheap, and a topic may carry more than one id at a time (briefly,
//! around retries and resubscribes).

use std::collections::{BTreeMap, BTreeSet};
use sub_types::{SubscriptionId, Topic};

/// Per-topic set of subscription ids.
///
/// Views are returned as owned, deterministically ordered vectors so
/// callers can iterate them while the index keeps changing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TopicIndex {
    map: BTreeMap<Topic, BTreeSet<SubscriptionId>>,
}

impl TopicIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` under `topic`. Re-recording an existing pair is a no-op.
    pub fn set(&mut self, topic: Topic, id: SubscriptionId) {
        self.map.entry(topic).or_default().insert(id);
    }

    /// Get every id held under `topic`, ordered. Empty if the topic is unknown.
    pub fn get(&self, topic: &Topic) -> Vec<SubscriptionId> {
        self.map
            .get(topic)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `id` is recorded under `topic`.
    pub fn exists(&self, topic: &Topic, id: &SubscriptionId) -> bool {
        self.map.get(topic).is_some_and(|ids| ids.contains(id))
    }

    /// Remove `id` from `topic`. Drops the topic entirely once its last
    /// id is gone.
    pub fn remove(&mut self, topic: &Topic, id: &SubscriptionId) {
        if let Some(ids) = self.map.get_mut(topic) {
            ids.remove(id);
            if ids.is_empty() {
                self.map.remove(topic);
            }
        }
    }

    /// Remove a topic and all of its ids.
    pub fn remove_topic(&mut self, topic: &Topic) {
        self.map.remove(topic);
    }

    /// Every topic with at least one id, ordered.
    pub fn topics(&self) -> Vec<Topic> {
        self.map.keys().cloned().collect()
    }

    /// Whether `topic` holds at least one id.
    pub fn contains_topic(&self, topic: &Topic) -> bool {
        self.map.contains_key(topic)
    }

    /// Number of topics with at least one id.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index holds no topics at all.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every topic and id.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}
