//! Pending subscribe requests awaiting relay acknowledgement.
//!
//! A subscribe is staged here before its RPC goes out and leaves only
//! when an acknowledgement lands. Entries therefore survive RPC
//! failures, which is what makes heartbeat-driven retries possible: the
//! retry loop re-issues whatever is still in this queue.
//!
//! Keyed by topic. Staging a topic twice keeps the latest request, so a
//! retry and a fresh caller subscribe can never produce two queue
//! entries for one topic.

use std::collections::BTreeMap;
use sub_types::{SubscribeRequest, Topic};

/// In-flight subscribe requests, keyed by topic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingQueue {
    requests: BTreeMap<Topic, SubscribeRequest>,
}

impl PendingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `request` under its topic, replacing any staged request for
    /// the same topic.
    pub fn insert(&mut self, request: SubscribeRequest) {
        self.requests.insert(request.topic.clone(), request);
    }

    /// Remove and return the staged request for `topic`, if any.
    pub fn remove(&mut self, topic: &Topic) -> Option<SubscribeRequest> {
        self.requests.remove(topic)
    }

    /// Look at the staged request for `topic`.
    pub fn get(&self, topic: &Topic) -> Option<&SubscribeRequest> {
        self.requests.get(topic)
    }

    /// Whether a request is staged for `topic`.
    pub fn contains(&self, topic: &Topic) -> bool {
        self.requests.contains_key(topic)
    }

    /// Every staged request, ordered by topic.
    pub fn requests(&self) -> Vec<SubscribeRequest> {
        self.requests.values().cloned().collect()
    }

    /// Every staged topic, ordered.
    pub fn topics(&self) -> Vec<Topic> {
        self.requests.keys().cloned().collect()
    }

    /// Number of staged requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Drop every staged request.
    pub fn clear(&mut self) {
        self.requests.clear();
    }
}
