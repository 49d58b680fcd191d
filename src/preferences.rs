//! Settings operations behind the popup.
//!
//! Limit changes keep the blocked flags consistent with the counters: a
//! flag is set iff usage has reached the new limit.

use crate::ledger::{
    self, Key, Theme, DEFAULT_DAILY_LIMIT_MINUTES, DEFAULT_SCROLL_LIMIT_COUNT,
    DEFAULT_SHORTS_LIMIT_MINUTES,
};
use crate::store::{KeyValueStore, StoreError};
use serde::Serialize;
use serde_json::json;

/// Upper bound of the daily allowance slider, minutes.
pub const MAX_DAILY_LIMIT_MINUTES: u64 = 120;

/// Snapshot of the non-ledger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub hide_shorts: bool,
    pub scroll_limit_active: bool,
    pub scroll_limit_count: u64,
    pub restore_dislikes: bool,
    pub theme: Theme,
}

impl Preferences {
    pub async fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let theme = store
            .get(Key::Theme.as_str())
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Ok(Self {
            hide_shorts: read_flag(store, Key::HideShorts, true).await?,
            scroll_limit_active: read_flag(store, Key::ScrollLimitActive, true).await?,
            scroll_limit_count: ledger::read_u64(
                store,
                Key::ScrollLimitCount,
                DEFAULT_SCROLL_LIMIT_COUNT,
            )
            .await?,
            restore_dislikes: read_flag(store, Key::RestoreDislikes, true).await?,
            theme,
        })
    }
}

/// Toggles that default to on read as `true` when absent.
async fn read_flag<S: KeyValueStore + ?Sized>(
    store: &S,
    key: Key,
    default: bool,
) -> Result<bool, StoreError> {
    Ok(store
        .get(key.as_str())
        .await?
        .and_then(|v| v.as_bool())
        .unwrap_or(default))
}

/// Turns the manual pause on or off.
pub async fn set_paused<S: KeyValueStore + ?Sized>(
    store: &S,
    paused: bool,
) -> Result<(), StoreError> {
    ledger::write(store, Key::IsPaused, json!(paused)).await?;
    tracing::info!(paused, "pause toggled");
    Ok(())
}

/// Sets the general daily limit, clamped to the slider range. Returns the stored value.
pub async fn set_daily_limit<S: KeyValueStore + ?Sized>(
    store: &S,
    minutes: u64,
) -> Result<u64, StoreError> {
    let minutes = minutes.min(MAX_DAILY_LIMIT_MINUTES);
    ledger::write(store, Key::DailyLimit, json!(minutes)).await?;
    sync_blocked_flag(store, Key::DailyUsage, minutes, Key::IsBlocked).await?;
    Ok(minutes)
}

/// Sets the short-form daily limit. Returns the stored value.
pub async fn set_shorts_limit<S: KeyValueStore + ?Sized>(
    store: &S,
    minutes: u64,
) -> Result<u64, StoreError> {
    ledger::write(store, Key::ShortsLimit, json!(minutes)).await?;
    sync_blocked_flag(store, Key::ShortsUsage, minutes, Key::IsShortsBlocked).await?;
    Ok(minutes)
}

async fn sync_blocked_flag<S: KeyValueStore + ?Sized>(
    store: &S,
    usage_key: Key,
    limit_minutes: u64,
    flag_key: Key,
) -> Result<(), StoreError> {
    let usage = ledger::read_u64(store, usage_key, 0).await?;
    let blocked = usage >= limit_minutes.saturating_mul(60);
    ledger::write(store, flag_key, json!(blocked)).await
}

/// Sets the number of videos per session, never below one.
pub async fn set_scroll_limit_count<S: KeyValueStore + ?Sized>(
    store: &S,
    count: u64,
) -> Result<u64, StoreError> {
    let count = count.max(1);
    ledger::write(store, Key::ScrollLimitCount, json!(count)).await?;
    Ok(count)
}

pub async fn set_hide_shorts<S: KeyValueStore + ?Sized>(
    store: &S,
    on: bool,
) -> Result<(), StoreError> {
    ledger::write(store, Key::HideShorts, json!(on)).await
}

pub async fn set_scroll_limit_active<S: KeyValueStore + ?Sized>(
    store: &S,
    on: bool,
) -> Result<(), StoreError> {
    ledger::write(store, Key::ScrollLimitActive, json!(on)).await
}

pub async fn set_restore_dislikes<S: KeyValueStore + ?Sized>(
    store: &S,
    on: bool,
) -> Result<(), StoreError> {
    ledger::write(store, Key::RestoreDislikes, json!(on)).await
}

/// Flips the theme and returns the new one.
pub async fn toggle_theme<S: KeyValueStore + ?Sized>(store: &S) -> Result<Theme, StoreError> {
    let next = Preferences::load(store).await?.theme.toggled();
    ledger::write(store, Key::Theme, json!(next)).await?;
    Ok(next)
}

/// Restores both limits and every preference to the install defaults.
///
/// Usage counters and the pause are left alone.
pub async fn reset_preferences<S: KeyValueStore + ?Sized>(store: &S) -> Result<(), StoreError> {
    for key in [
        Key::HideShorts,
        Key::ScrollLimitActive,
        Key::ScrollLimitCount,
        Key::RestoreDislikes,
        Key::Theme,
    ] {
        if let Some(default) = key.install_default() {
            ledger::write(store, key, default).await?;
        }
    }
    set_daily_limit(store, DEFAULT_DAILY_LIMIT_MINUTES).await?;
    set_shorts_limit(store, DEFAULT_SHORTS_LIMIT_MINUTES).await?;
    tracing::info!("preferences reset to defaults");
    Ok(())
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
