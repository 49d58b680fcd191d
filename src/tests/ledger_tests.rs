use super::*;
use crate::store::MemoryStore;

#[test]
fn test_key_names_are_stable() {
    let names: Vec<&str> = Key::ALL.iter().map(|k| k.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "dailyLimit",
            "dailyUsage",
            "lastReset",
            "isBlocked",
            "isPaused",
            "hideShorts",
            "scrollLimitActive",
            "scrollLimitCount",
            "restoreDislikes",
            "theme",
            "shortsUsage",
            "shortsLimit",
            "isShortsBlocked",
        ]
    );
}

#[test]
fn test_key_from_name() {
    for key in Key::ALL {
        assert_eq!(Key::from_name(key.as_str()), Some(key));
    }
    assert_eq!(Key::from_name("unknown"), None);
}

#[test]
fn test_install_defaults_table() {
    assert_eq!(Key::DailyLimit.install_default(), Some(json!(60)));
    assert_eq!(Key::ShortsLimit.install_default(), Some(json!(5)));
    assert_eq!(Key::Theme.install_default(), Some(json!("dark")));
    assert_eq!(Key::LastReset.install_default(), None);
}

#[test]
fn test_block_state_keys() {
    let watched: Vec<Key> = Key::ALL
        .into_iter()
        .filter(|k| k.affects_block_state())
        .collect();
    assert_eq!(watched, vec![Key::IsBlocked, Key::IsPaused, Key::IsShortsBlocked]);
}

#[tokio::test]
async fn test_load_empty_store_uses_read_site_defaults() {
    let store = MemoryStore::new();
    let ledger = UsageLedger::load(&store).await.unwrap();

    assert_eq!(
        ledger,
        UsageLedger {
            daily_limit_minutes: 60,
            daily_usage_seconds: 0,
            shorts_limit_minutes: 5,
            shorts_usage_seconds: 0,
            last_reset_date: None,
            is_blocked: false,
            is_shorts_blocked: false,
            is_paused: false,
        }
    );
}

#[tokio::test]
async fn test_ill_typed_values_fall_back_to_defaults() {
    let store = MemoryStore::with_entries([
        ("dailyLimit", json!("lots")),
        ("dailyUsage", json!(-5)),
        ("isBlocked", json!("yes")),
        ("lastReset", json!("yesterday")),
    ]);

    let ledger = UsageLedger::load(&store).await.unwrap();

    assert_eq!(ledger.daily_limit_minutes, 60);
    assert_eq!(ledger.daily_usage_seconds, 0);
    assert!(!ledger.is_blocked);
    assert_eq!(ledger.last_reset_date, None);
}

#[tokio::test]
async fn test_fractional_numbers_are_truncated_not_defaulted() {
    let store = MemoryStore::with_entries([
        ("dailyLimit", json!(0.5)),
        ("dailyUsage", json!(300.0)),
        ("shortsUsage", json!(12.7)),
    ]);

    let ledger = UsageLedger::load(&store).await.unwrap();

    assert_eq!(ledger.daily_limit_minutes, 0);
    assert_eq!(ledger.daily_usage_seconds, 300);
    assert_eq!(ledger.shorts_usage_seconds, 12);
}

#[tokio::test]
async fn test_zero_limit_is_kept() {
    let store = MemoryStore::with_entries([("dailyLimit", json!(0))]);
    let ledger = UsageLedger::load(&store).await.unwrap();
    assert_eq!(ledger.daily_limit_minutes, 0);
}

#[tokio::test]
async fn test_date_round_trip_format() {
    let store = MemoryStore::new();
    let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();

    write_date(&store, Key::LastReset, date).await.unwrap();

    assert_eq!(store.get("lastReset").await.unwrap(), Some(json!("2026-01-02")));
    assert_eq!(read_date(&store, Key::LastReset).await.unwrap(), Some(date));
}

#[test]
fn test_remaining_saturates() {
    let ledger = UsageLedger {
        daily_limit_minutes: 1,
        daily_usage_seconds: 90,
        shorts_limit_minutes: 5,
        shorts_usage_seconds: 60,
        last_reset_date: None,
        is_blocked: true,
        is_shorts_blocked: false,
        is_paused: false,
    };
    assert_eq!(ledger.daily_remaining_seconds(), 0);
    assert_eq!(ledger.shorts_remaining_seconds(), 240);
}

#[test]
fn test_theme_toggle_and_serde() {
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
    assert_eq!(serde_json::to_value(Theme::Light).unwrap(), json!("light"));
}
