use super::*;
use crate::config::AccountingConfig;
use crate::ledger::{Key, UsageLedger};
use crate::store::MemoryStore;
use serde_json::json;

#[test]
fn test_parse_heartbeat() {
    assert_eq!(
        Message::parse(r#"{"type":"HEARTBEAT","isShorts":true}"#).unwrap(),
        Message::Heartbeat { is_shorts: true }
    );
    assert_eq!(
        Message::parse(r#"{"type":"HEARTBEAT"}"#).unwrap(),
        Message::Heartbeat { is_shorts: false }
    );
}

#[test]
fn test_parse_extensions() {
    assert_eq!(
        Message::parse(r#"{"type":"EXTEND_TIME"}"#).unwrap(),
        Message::ExtendTime
    );
    assert_eq!(
        Message::parse(" {\"type\":\"EXTEND_SHORTS_TIME\"}\n").unwrap(),
        Message::ExtendShortsTime
    );
}

#[test]
fn test_parse_rejects_unknown_type() {
    assert!(Message::parse(r#"{"type":"RESET_EVERYTHING"}"#).is_err());
    assert!(Message::parse("not json").is_err());
}

#[test]
fn test_serialized_shape() {
    assert_eq!(
        serde_json::to_value(Message::Heartbeat { is_shorts: true }).unwrap(),
        json!({"type": "HEARTBEAT", "isShorts": true})
    );
    assert_eq!(
        serde_json::to_value(Message::ExtendShortsTime).unwrap(),
        json!({"type": "EXTEND_SHORTS_TIME"})
    );
}

fn service_with(
    entries: Vec<(&str, serde_json::Value)>,
) -> Arc<UsageAccountingService<Arc<MemoryStore>>> {
    let store = Arc::new(MemoryStore::with_entries(entries));
    Arc::new(UsageAccountingService::new(
        store,
        AccountingConfig::default(),
    ))
}

#[tokio::test]
async fn test_handle_routes_extensions() {
    let service = service_with(vec![
        (Key::DailyLimit.as_str(), json!(60)),
        (Key::ShortsLimit.as_str(), json!(5)),
        (Key::IsBlocked.as_str(), json!(true)),
    ]);

    service.handle(Message::ExtendTime).await.unwrap();
    service.handle(Message::ExtendShortsTime).await.unwrap();

    let ledger = UsageLedger::load(service.store().as_ref()).await.unwrap();
    assert_eq!(ledger.daily_limit_minutes, 65);
    assert_eq!(ledger.shorts_limit_minutes, 10);
    assert!(!ledger.is_blocked);
}

#[tokio::test]
async fn test_background_worker_applies_messages_in_order() {
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    let service = service_with(vec![
        (Key::LastReset.as_str(), json!(today)),
        (Key::DailyLimit.as_str(), json!(60)),
    ]);
    let store = service.store().clone();

    let (tx, worker) = spawn_background(service);
    tx.send(Message::Heartbeat { is_shorts: true }).unwrap();
    // Arrives within the debounce gap and is dropped
    tx.send(Message::Heartbeat { is_shorts: true }).unwrap();
    tx.send(Message::ExtendTime).unwrap();
    drop(tx);
    worker.await.unwrap();

    let ledger = UsageLedger::load(store.as_ref()).await.unwrap();
    assert_eq!(ledger.daily_usage_seconds, 5);
    assert_eq!(ledger.shorts_usage_seconds, 5);
    assert_eq!(ledger.daily_limit_minutes, 65);
}
