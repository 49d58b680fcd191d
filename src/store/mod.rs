//! Flat key-value storage for the usage ledger.
//!
//! The store is the only shared state between the accounting service and
//! its readers. It offers:
//! - Async `get` / `set` over string keys with JSON values
//! - Last-write-wins semantics, no transactions
//! - Change notifications through a broadcast subscription
//!
//! Two backends are provided: [`MemoryStore`] for a single process and
//! [`FileStore`] for a JSON document shared between processes.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the change-notification channel of each backend.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A single value change published by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    /// Value before the write, `None` if the key was absent
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// Async key-value store with change notifications.
///
/// Each call is an independent round trip. Callers that read-modify-write
/// several keys get no atomicity across them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes a value. Subscribers are notified only when the value changes.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Registers a new subscriber for value changes.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        (**self).subscribe()
    }
}

/// Publishes a change if the value actually differs from the previous one.
///
/// A send error only means nobody is subscribed right now.
pub(crate) fn publish_change(
    tx: &broadcast::Sender<StorageChange>,
    key: &str,
    old_value: Option<Value>,
    new_value: &Value,
) {
    if old_value.as_ref() == Some(new_value) {
        return;
    }
    let _ = tx.send(StorageChange {
        key: key.to_string(),
        old_value,
        new_value: new_value.clone(),
    });
}

#[cfg(test)]
#[path = "../tests/store_tests.rs"]
mod tests;
