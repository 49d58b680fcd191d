//! File-backed store.
//!
//! All keys live in one JSON object document with support for:
//! - Atomic writes via temp file + rename
//! - Cross-process exclusion via an advisory lock on a sibling `.lock` file
//!
//! Change notifications are only delivered to subscribers in the same
//! process; other processes observe writes on their next read.

use super::{publish_change, KeyValueStore, StorageChange, StoreError, CHANGE_CHANNEL_CAPACITY};
use async_trait::async_trait;
use fs2::FileExt;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Key-value store persisted as a single JSON document.
pub struct FileStore {
    /// Path to the JSON document.
    path: PathBuf,
    /// Path to the advisory lock file.
    lock_path: PathBuf,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStore {
    /// Creates a store over `path`. The file is created on first write.
    pub fn new(path: PathBuf) -> Self {
        let lock_path = sibling_path(&path, ".lock");
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path,
            lock_path,
            changes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        Ok(file)
    }

    fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::serialization(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = sibling_path(&self.path, ".tmp");
        let content = serde_json::to_string_pretty(document)?;
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(content.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let result = self.read_document();
        let _ = lock.unlock();
        Ok(result?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = self.read_document().and_then(|mut document| {
            let old_value = document.insert(key.to_string(), value.clone());
            self.write_document(&document)?;
            Ok(old_value)
        });
        let _ = lock.unlock();

        let old_value = result?;
        tracing::trace!(key, path = %self.path.display(), "store write");
        publish_change(&self.changes, key, old_value, &value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Appends `suffix` to the file name of `path` (`storage.json` -> `storage.json.lock`).
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("storage"));
    name.push(suffix);
    path.with_file_name(name)
}
