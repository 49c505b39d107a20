//! Inbound-message cache seam.
//!
//! The relay client caches inbound messages per topic elsewhere in the
//! stack. The subscriber only ever needs one operation against that
//! cache: purging a topic once its last subscription is released, so
//! stale messages cannot leak into a future subscription on the same
//! topic.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use sub_types::Topic;

/// Trait for the per-topic inbound-message cache.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Drop every cached message for `topic`.
    ///
    /// Unknown topics are a no-op.
    async fn delete(&self, topic: &Topic) -> StorageResult<()>;
}

/// In-memory message cache for testing.
///
/// Holds raw message payloads per topic so tests can verify that an
/// unsubscribe purged the right topic and only that topic.
#[derive(Default, Clone)]
pub struct MemoryMessageStore {
    messages: Arc<Mutex<HashMap<Topic, Vec<String>>>>,
}

impl MemoryMessageStore {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a message payload under `topic`.
    pub fn insert(&self, topic: Topic, payload: impl Into<String>) {
        self.messages
            .lock()
            .unwrap()
            .entry(topic)
            .or_default()
            .push(payload.into());
    }

    /// Get the cached payloads for `topic`.
    pub fn messages(&self, topic: &Topic) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether any payloads are cached for `topic`.
    pub fn contains(&self, topic: &Topic) -> bool {
        self.messages.lock().unwrap().contains_key(topic)
    }

    /// Number of topics with cached payloads.
    pub fn topic_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn delete(&self, topic: &Topic) -> StorageResult<()> {
        self.messages.lock().unwrap().remove(topic);
        Ok(())
    }
}
