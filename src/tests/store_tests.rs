use super::*;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_memory_store_get_missing_key() {
    let store = MemoryStore::new();
    assert_eq!(store.get("dailyLimit").await.unwrap(), None);
}

#[tokio::test]
async fn test_memory_store_last_write_wins() {
    let store = MemoryStore::new();
    store.set("dailyLimit", json!(60)).await.unwrap();
    store.set("dailyLimit", json!(65)).await.unwrap();
    assert_eq!(store.get("dailyLimit").await.unwrap(), Some(json!(65)));
}

#[tokio::test]
async fn test_memory_store_notifies_only_on_change() {
    let store = MemoryStore::new();
    let mut rx = store.subscribe();

    store.set("isBlocked", json!(false)).await.unwrap();
    store.set("isBlocked", json!(false)).await.unwrap();
    store.set("isBlocked", json!(true)).await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.key, "isBlocked");
    assert_eq!(first.old_value, None);
    assert_eq!(first.new_value, json!(false));

    let second = rx.recv().await.unwrap();
    assert_eq!(second.old_value, Some(json!(false)));
    assert_eq!(second.new_value, json!(true));

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_arc_store_delegates() {
    let store = Arc::new(MemoryStore::new());
    let shared: Arc<dyn KeyValueStore> = store.clone();

    shared.set("theme", json!("light")).await.unwrap();

    assert_eq!(store.get("theme").await.unwrap(), Some(json!("light")));
}

#[tokio::test]
async fn test_file_store_missing_file_reads_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("storage.json"));

    assert_eq!(store.get("dailyUsage").await.unwrap(), None);
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("storage.json");

    let store = FileStore::new(path.clone());
    store.set("dailyUsage", json!(125)).await.unwrap();
    store.set("lastReset", json!("2026-10-19")).await.unwrap();

    let reopened = FileStore::new(path.clone());
    assert_eq!(reopened.get("dailyUsage").await.unwrap(), Some(json!(125)));
    assert_eq!(
        reopened.get("lastReset").await.unwrap(),
        Some(json!("2026-10-19"))
    );

    let content = std::fs::read_to_string(&path).unwrap();
    let document: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(document["dailyUsage"], json!(125));
    assert!(!temp_dir.path().join("nested").join("storage.json.tmp").exists());
}

#[tokio::test]
async fn test_file_store_notifies_subscribers() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("storage.json"));
    let mut rx = store.subscribe();

    store.set("isPaused", json!(true)).await.unwrap();

    let change = rx.recv().await.unwrap();
    assert_eq!(change.key, "isPaused");
    assert_eq!(change.new_value, json!(true));
}

#[tokio::test]
async fn test_file_store_rejects_non_object_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let store = FileStore::new(path);
    let result = store.get("dailyUsage").await;

    assert!(matches!(result, Err(StoreError::Serialization { .. })));
}

#[tokio::test]
async fn test_file_store_corrupt_document_is_serialization_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = FileStore::new(path);
    let result = store.set("dailyUsage", json!(5)).await;

    assert!(matches!(result, Err(StoreError::Serialization { .. })));
}

#[test]
fn test_store_error_display() {
    let err = StoreError::unavailable("disk gone");
    assert_eq!(err.to_string(), "store unavailable: disk gone");
}
