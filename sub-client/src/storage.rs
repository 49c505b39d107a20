//! Snapshot persistence for the subscriber.
//!
//! This module provides a trait for storing the full subscription
//! snapshot under an opaque string key, plus a memory-based
//! implementation for testing and a JSON-file implementation for
//! simple deployments.
//!
//! Only acknowledged subscriptions are ever persisted. Requests still
//! awaiting acknowledgement live in memory and are re-issued by the
//! retry loop, never restored from disk.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use sub_types::ActiveSubscription;

/// Trait for persisting subscription snapshots.
///
/// A snapshot is the complete list of acknowledged subscriptions; every
/// write replaces the previous snapshot for that key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing was stored.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<ActiveSubscription>>>;

    /// Overwrite the snapshot stored under `key`.
    async fn set(&self, key: &str, snapshot: &[ActiveSubscription]) -> StorageResult<()>;
}

/// In-memory snapshot store for testing.
///
/// Stores snapshots in a thread-safe HashMap. Not persistent - all data
/// is lost when the store is dropped.
#[derive(Default, Clone)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, Vec<ActiveSubscription>>>>,
}

impl MemoryStorage {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Clear all snapshots from the store.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[async_trait]
impl SnapshotStore for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<ActiveSubscription>>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, snapshot: &[ActiveSubscription]) -> StorageResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), snapshot.to_vec());
        Ok(())
    }
}

/// File-backed snapshot store.
///
/// Keeps every key in one pretty-printed JSON document, rewritten on
/// each set. The parent directory must exist. Suitable for CLI tools
/// and tests; production embeddings usually bring their own
/// [`SnapshotStore`] over the host key-value store.
pub struct JsonFileStorage {
    path: PathBuf,
    // serializes read-modify-write cycles on the document
    lock: tokio::sync::Mutex<()>,
}

impl JsonFileStorage {
    /// Create a store backed by the JSON document at `path`.
    ///
    /// The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_document(&self) -> StorageResult<HashMap<String, Vec<ActiveSubscription>>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<ActiveSubscription>>> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(document.remove(key))
    }

    async fn set(&self, key: &str, snapshot: &[ActiveSubscription]) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), snapshot.to_vec());
        let contents = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}
