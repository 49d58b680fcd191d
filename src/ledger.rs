//! Typed view over the flat key namespace.
//!
//! Every persisted field has a stable string key, an install-time default
//! and a read-site default. Reads never fail on missing or ill-typed values;
//! they fall back to the read-site default instead.

use crate::store::{KeyValueStore, StoreError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default general daily cap, minutes.
pub const DEFAULT_DAILY_LIMIT_MINUTES: u64 = 60;
/// Default short-form daily cap, minutes.
pub const DEFAULT_SHORTS_LIMIT_MINUTES: u64 = 5;
/// Default number of videos per session before the feed stops.
pub const DEFAULT_SCROLL_LIMIT_COUNT: u64 = 10;

/// Storage format of `lastReset`.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Every key persisted in the store.
///
/// The string identifiers are part of the storage format and must not be
/// renamed without a migration in [`crate::settings::install_defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    DailyLimit,
    DailyUsage,
    LastReset,
    IsBlocked,
    IsPaused,
    HideShorts,
    ScrollLimitActive,
    ScrollLimitCount,
    RestoreDislikes,
    Theme,
    ShortsUsage,
    ShortsLimit,
    IsShortsBlocked,
}

impl Key {
    pub const ALL: [Key; 13] = [
        Key::DailyLimit,
        Key::DailyUsage,
        Key::LastReset,
        Key::IsBlocked,
        Key::IsPaused,
        Key::HideShorts,
        Key::ScrollLimitActive,
        Key::ScrollLimitCount,
        Key::RestoreDislikes,
        Key::Theme,
        Key::ShortsUsage,
        Key::ShortsLimit,
        Key::IsShortsBlocked,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Key::DailyLimit => "dailyLimit",
            Key::DailyUsage => "dailyUsage",
            Key::LastReset => "lastReset",
            Key::IsBlocked => "isBlocked",
            Key::IsPaused => "isPaused",
            Key::HideShorts => "hideShorts",
            Key::ScrollLimitActive => "scrollLimitActive",
            Key::ScrollLimitCount => "scrollLimitCount",
            Key::RestoreDislikes => "restoreDislikes",
            Key::Theme => "theme",
            Key::ShortsUsage => "shortsUsage",
            Key::ShortsLimit => "shortsLimit",
            Key::IsShortsBlocked => "isShortsBlocked",
        }
    }

    pub fn from_name(name: &str) -> Option<Key> {
        Key::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Value written at install time, or `None` for keys that start unset.
    ///
    /// `lastReset` is deliberately absent so the first heartbeat performs a
    /// day rollover.
    pub fn install_default(self) -> Option<Value> {
        let value = match self {
            Key::DailyLimit => json!(DEFAULT_DAILY_LIMIT_MINUTES),
            Key::DailyUsage => json!(0),
            Key::LastReset => return None,
            Key::IsBlocked => json!(false),
            Key::IsPaused => json!(false),
            Key::HideShorts => json!(true),
            Key::ScrollLimitActive => json!(true),
            Key::ScrollLimitCount => json!(DEFAULT_SCROLL_LIMIT_COUNT),
            Key::RestoreDislikes => json!(true),
            Key::Theme => json!(Theme::Dark),
            Key::ShortsUsage => json!(0),
            Key::ShortsLimit => json!(DEFAULT_SHORTS_LIMIT_MINUTES),
            Key::IsShortsBlocked => json!(false),
        };
        Some(value)
    }

    /// Returns true for the three flags the presentation layer watches.
    pub fn affects_block_state(self) -> bool {
        matches!(self, Key::IsPaused | Key::IsBlocked | Key::IsShortsBlocked)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Popup color theme.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => f.write_str("dark"),
            Theme::Light => f.write_str("light"),
        }
    }
}

/// Reads a non-negative number, falling back to `default` when absent,
/// negative or not a number. Fractional values are truncated.
pub async fn read_u64<S: KeyValueStore + ?Sized>(
    store: &S,
    key: Key,
    default: u64,
) -> Result<u64, StoreError> {
    Ok(store
        .get(key.as_str())
        .await?
        .and_then(|v| as_whole_number(&v))
        .unwrap_or(default))
}

fn as_whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

/// Reads a boolean flag, absent or ill-typed values read as `false`.
pub async fn read_bool<S: KeyValueStore + ?Sized>(store: &S, key: Key) -> Result<bool, StoreError> {
    Ok(store
        .get(key.as_str())
        .await?
        .and_then(|v| v.as_bool())
        .unwrap_or(false))
}

/// Reads a calendar date stored as `YYYY-MM-DD`.
pub async fn read_date<S: KeyValueStore + ?Sized>(
    store: &S,
    key: Key,
) -> Result<Option<NaiveDate>, StoreError> {
    Ok(store
        .get(key.as_str())
        .await?
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok()))
}

pub async fn write<S: KeyValueStore + ?Sized>(
    store: &S,
    key: Key,
    value: Value,
) -> Result<(), StoreError> {
    store.set(key.as_str(), value).await
}

pub async fn write_date<S: KeyValueStore + ?Sized>(
    store: &S,
    key: Key,
    date: NaiveDate,
) -> Result<(), StoreError> {
    write(store, key, json!(date.format(DATE_FORMAT).to_string())).await
}

/// Snapshot of the persisted usage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLedger {
    pub daily_limit_minutes: u64,
    pub daily_usage_seconds: u64,
    pub shorts_limit_minutes: u64,
    pub shorts_usage_seconds: u64,
    pub last_reset_date: Option<NaiveDate>,
    pub is_blocked: bool,
    pub is_shorts_blocked: bool,
    pub is_paused: bool,
}

impl UsageLedger {
    /// Loads every ledger field, applying read-site defaults.
    pub async fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            daily_limit_minutes: read_u64(store, Key::DailyLimit, DEFAULT_DAILY_LIMIT_MINUTES)
                .await?,
            daily_usage_seconds: read_u64(store, Key::DailyUsage, 0).await?,
            shorts_limit_minutes: read_u64(store, Key::ShortsLimit, DEFAULT_SHORTS_LIMIT_MINUTES)
                .await?,
            shorts_usage_seconds: read_u64(store, Key::ShortsUsage, 0).await?,
            last_reset_date: read_date(store, Key::LastReset).await?,
            is_blocked: read_bool(store, Key::IsBlocked).await?,
            is_shorts_blocked: read_bool(store, Key::IsShortsBlocked).await?,
            is_paused: read_bool(store, Key::IsPaused).await?,
        })
    }

    pub fn daily_limit_seconds(&self) -> u64 {
        self.daily_limit_minutes.saturating_mul(60)
    }

    pub fn shorts_limit_seconds(&self) -> u64 {
        self.shorts_limit_minutes.saturating_mul(60)
    }

    /// General allowance left today, in seconds.
    pub fn daily_remaining_seconds(&self) -> u64 {
        self.daily_limit_seconds()
            .saturating_sub(self.daily_usage_seconds)
    }

    /// Short-form allowance left today, in seconds.
    pub fn shorts_remaining_seconds(&self) -> u64 {
        self.shorts_limit_seconds()
            .saturating_sub(self.shorts_usage_seconds)
    }
}

#[cfg(test)]
#[path = "tests/ledger_tests.rs"]
mod tests;
