//! In-process store backed by a hash map.

use super::{publish_change, KeyValueStore, StorageChange, StoreError, CHANGE_CHANNEL_CAPACITY};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Process-local key-value store.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Creates a store pre-populated with the given entries (no notifications).
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            entries: RwLock::new(map),
            changes,
        }
    }

    /// Returns a copy of every stored entry.
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let old_value = self
            .entries
            .write()
            .await
            .insert(key.to_string(), value.clone());
        publish_change(&self.changes, key, old_value, &value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
