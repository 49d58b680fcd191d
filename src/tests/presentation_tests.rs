use super::*;
use crate::store::{FileStore, MemoryStore};
use serde_json::json;
use tokio::time::timeout;

fn flags(is_paused: bool, is_blocked: bool, is_shorts_blocked: bool) -> BlockFlags {
    BlockFlags {
        is_paused,
        is_blocked,
        is_shorts_blocked,
    }
}

#[test]
fn test_evaluate_priority() {
    assert_eq!(evaluate(&flags(false, false, false), true), None);
    assert_eq!(
        evaluate(&flags(true, true, true), true),
        Some(BlockReason::Paused)
    );
    assert_eq!(
        evaluate(&flags(false, true, true), true),
        Some(BlockReason::DailyLimit)
    );
    assert_eq!(
        evaluate(&flags(false, false, true), true),
        Some(BlockReason::ShortsLimit)
    );
}

#[test]
fn test_shorts_block_only_applies_on_short_form_pages() {
    assert_eq!(evaluate(&flags(false, false, true), false), None);
    assert_eq!(
        evaluate(&flags(false, true, false), false),
        Some(BlockReason::DailyLimit)
    );
    assert_eq!(
        evaluate(&flags(true, false, false), false),
        Some(BlockReason::Paused)
    );
}

#[test]
fn test_extend_actions() {
    assert_eq!(BlockReason::Paused.extend_action(), None);
    assert_eq!(
        BlockReason::DailyLimit.extend_action(),
        Some(Message::ExtendTime)
    );
    assert_eq!(
        BlockReason::ShortsLimit.extend_action(),
        Some(Message::ExtendShortsTime)
    );
}

#[test]
fn test_block_texts() {
    assert_eq!(BlockReason::Paused.title(), "YouTube Paused");
    assert_eq!(BlockReason::ShortsLimit.title(), "Shorts Limit Reached");
    assert_eq!(BlockReason::DailyLimit.title(), "Time for a break?");
    assert_eq!(BlockReason::DailyLimit.to_string(), "daily-limit");
}

#[test]
fn test_format_remaining() {
    assert_eq!(format_remaining(Duration::ZERO), "0m");
    assert_eq!(format_remaining(Duration::from_secs(59)), "0m");
    assert_eq!(format_remaining(Duration::from_secs(45 * 60)), "45m");
    assert_eq!(format_remaining(Duration::from_secs(3600)), "1h 0m");
    assert_eq!(format_remaining(Duration::from_secs(80 * 60 + 30)), "1h 20m");
}

#[tokio::test]
async fn test_status_summary() {
    let store = MemoryStore::with_entries([
        ("dailyLimit", json!(90)),
        ("dailyUsage", json!(600)),
        ("shortsLimit", json!(5)),
        ("shortsUsage", json!(300)),
        ("isShortsBlocked", json!(true)),
    ]);

    let summary = StatusSummary::load(&store, true).await.unwrap();
    assert_eq!(summary.daily_remaining, "1h 20m");
    assert_eq!(summary.shorts_remaining, "0m");
    assert_eq!(summary.block, Some(BlockReason::ShortsLimit));

    let off_shorts = StatusSummary::load(&store, false).await.unwrap();
    assert_eq!(off_shorts.block, None);
    assert!(off_shorts.to_string().contains("Block:  none"));
}

async fn wait_for_state(
    rx: &mut watch::Receiver<Option<BlockReason>>,
    expected: Option<BlockReason>,
) {
    timeout(Duration::from_secs(5), rx.wait_for(|state| *state == expected))
        .await
        .expect("block state did not change in time")
        .expect("monitor stopped");
}

#[tokio::test]
async fn test_monitor_reacts_to_store_changes_and_navigation() {
    let store = Arc::new(MemoryStore::new());
    let (nav_tx, nav_rx) = watch::channel(false);
    let monitor = BlockMonitor::spawn(store.clone(), nav_rx, Duration::from_secs(3600));
    let mut rx = monitor.subscribe();

    store.set("isShortsBlocked", json!(true)).await.unwrap();
    nav_tx.send(true).unwrap();
    wait_for_state(&mut rx, Some(BlockReason::ShortsLimit)).await;

    store.set("isPaused", json!(true)).await.unwrap();
    wait_for_state(&mut rx, Some(BlockReason::Paused)).await;

    store.set("isBlocked", json!(true)).await.unwrap();
    store.set("isPaused", json!(false)).await.unwrap();
    wait_for_state(&mut rx, Some(BlockReason::DailyLimit)).await;

    store.set("isBlocked", json!(false)).await.unwrap();
    nav_tx.send(false).unwrap();
    wait_for_state(&mut rx, None).await;
    assert_eq!(monitor.current(), None);
}

#[tokio::test]
async fn test_monitor_refresh_picks_up_writes_from_other_processes() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");
    let watched = Arc::new(FileStore::new(path.clone()));
    let (_nav_tx, nav_rx) = watch::channel(false);
    let monitor = BlockMonitor::spawn(watched, nav_rx, Duration::from_millis(50));
    let mut rx = monitor.subscribe();

    // A separate store instance stands in for another process
    let writer = FileStore::new(path);
    writer.set("isBlocked", json!(true)).await.unwrap();

    wait_for_state(&mut rx, Some(BlockReason::DailyLimit)).await;
}
