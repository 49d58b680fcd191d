//! Usage accounting: heartbeat ingestion, daily rollover and limit extensions.
//!
//! The service is the only writer of usage counters and blocked flags. Each
//! accepted heartbeat counts a fixed slice of usage towards the general
//! counter and, on short-form pages, towards the short-form counter as well.
//!
//! Every field is an independent read-modify-write against the store, so two
//! services racing on one store may lose an increment. The debounce gap is
//! what keeps duplicate heartbeats from several pages from double counting.

use crate::clock::{Clock, SystemClock};
use crate::config::AccountingConfig;
use crate::ledger::{self, Key, DEFAULT_DAILY_LIMIT_MINUTES, DEFAULT_SHORTS_LIMIT_MINUTES};
use crate::store::{KeyValueStore, StoreError};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Mutex;
use std::time::Instant;

/// What a single heartbeat did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// Arrived too soon after the last accepted heartbeat; nothing was read or written.
    Debounced,
    /// First heartbeat of a new day: counters and flags were reset, no usage counted.
    DayRolledOver { today: NaiveDate },
    /// Pause is active; nothing changed.
    Paused,
    /// Usage was counted.
    Counted(UsageTick),
}

/// Counter changes made by one counted heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageTick {
    /// New general usage, `None` when general usage is frozen by the daily block.
    pub daily_usage_seconds: Option<u64>,
    /// New short-form usage, `None` when not on a short-form page or already blocked.
    pub shorts_usage_seconds: Option<u64>,
    /// This heartbeat reached the general limit.
    pub daily_limit_reached: bool,
    /// This heartbeat reached the short-form limit.
    pub shorts_limit_reached: bool,
}

/// Usage accounting over a key-value store.
pub struct UsageAccountingService<S, C = SystemClock> {
    store: S,
    clock: C,
    config: AccountingConfig,
    /// When the last heartbeat was accepted. Lives as long as the service.
    last_accepted: Mutex<Option<Instant>>,
}

impl<S: KeyValueStore> UsageAccountingService<S, SystemClock> {
    pub fn new(store: S, config: AccountingConfig) -> Self {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: KeyValueStore, C: Clock> UsageAccountingService<S, C> {
    pub fn with_clock(store: S, clock: C, config: AccountingConfig) -> Self {
        Self {
            store,
            clock,
            config,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Claims the debounce window. The timestamp is recorded before any
    /// store access so concurrent callers see it immediately.
    fn try_accept_heartbeat(&self) -> bool {
        let now = self.clock.now();
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = *last {
            if now.saturating_duration_since(previous) < self.config.min_heartbeat_gap() {
                return false;
            }
        }
        *last = Some(now);
        true
    }

    /// Records that another slice of time was spent on the tracked site.
    ///
    /// Steps short-circuit in order: debounce, day rollover, pause, general
    /// usage (frozen once blocked), short-form usage (only on short-form
    /// pages, frozen once the short-form cap is hit).
    pub async fn record_heartbeat(
        &self,
        is_short_form: bool,
    ) -> Result<HeartbeatOutcome, StoreError> {
        if !self.try_accept_heartbeat() {
            tracing::trace!("heartbeat debounced");
            return Ok(HeartbeatOutcome::Debounced);
        }

        let store = &self.store;
        let today = self.clock.today();

        if ledger::read_date(store, Key::LastReset).await? != Some(today) {
            ledger::write(store, Key::DailyUsage, json!(0)).await?;
            ledger::write(store, Key::IsBlocked, json!(false)).await?;
            ledger::write(store, Key::ShortsUsage, json!(0)).await?;
            ledger::write(store, Key::IsShortsBlocked, json!(false)).await?;
            ledger::write_date(store, Key::LastReset, today).await?;
            tracing::info!(%today, "daily usage reset");
            return Ok(HeartbeatOutcome::DayRolledOver { today });
        }

        if ledger::read_bool(store, Key::IsPaused).await? {
            tracing::debug!("heartbeat ignored while paused");
            return Ok(HeartbeatOutcome::Paused);
        }

        let slice = self.config.heartbeat_slice_secs;
        let mut tick = UsageTick::default();

        if !ledger::read_bool(store, Key::IsBlocked).await? {
            let usage = ledger::read_u64(store, Key::DailyUsage, 0).await?;
            let limit_minutes =
                ledger::read_u64(store, Key::DailyLimit, DEFAULT_DAILY_LIMIT_MINUTES).await?;

            let new_usage = usage.saturating_add(slice);
            ledger::write(store, Key::DailyUsage, json!(new_usage)).await?;
            tick.daily_usage_seconds = Some(new_usage);

            if new_usage >= limit_minutes.saturating_mul(60) {
                ledger::write(store, Key::IsBlocked, json!(true)).await?;
                tick.daily_limit_reached = true;
                tracing::info!(usage_seconds = new_usage, limit_minutes, "daily limit reached");
            }
        }

        if is_short_form && !ledger::read_bool(store, Key::IsShortsBlocked).await? {
            let usage = ledger::read_u64(store, Key::ShortsUsage, 0).await?;
            let limit_minutes =
                ledger::read_u64(store, Key::ShortsLimit, DEFAULT_SHORTS_LIMIT_MINUTES).await?;

            let new_usage = usage.saturating_add(slice);
            ledger::write(store, Key::ShortsUsage, json!(new_usage)).await?;
            tick.shorts_usage_seconds = Some(new_usage);

            if new_usage >= limit_minutes.saturating_mul(60) {
                ledger::write(store, Key::IsShortsBlocked, json!(true)).await?;
                tick.shorts_limit_reached = true;
                tracing::info!(usage_seconds = new_usage, limit_minutes, "shorts limit reached");
            }
        }

        tracing::debug!(
            is_short_form,
            daily = ?tick.daily_usage_seconds,
            shorts = ?tick.shorts_usage_seconds,
            "heartbeat counted"
        );
        Ok(HeartbeatOutcome::Counted(tick))
    }

    /// Adds one extension step to the general limit and lifts the daily block.
    ///
    /// Returns the new limit in minutes.
    pub async fn extend_general_time(&self) -> Result<u64, StoreError> {
        self.extend(Key::DailyLimit, DEFAULT_DAILY_LIMIT_MINUTES, Key::IsBlocked)
            .await
    }

    /// Adds one extension step to the short-form limit and lifts the short-form block.
    ///
    /// Returns the new limit in minutes.
    pub async fn extend_short_form_time(&self) -> Result<u64, StoreError> {
        self.extend(Key::ShortsLimit, DEFAULT_SHORTS_LIMIT_MINUTES, Key::IsShortsBlocked)
            .await
    }

    async fn extend(&self, limit_key: Key, default: u64, flag_key: Key) -> Result<u64, StoreError> {
        let current = ledger::read_u64(&self.store, limit_key, default).await?;
        let extended = current.saturating_add(self.config.extension_minutes);
        ledger::write(&self.store, limit_key, json!(extended)).await?;
        ledger::write(&self.store, flag_key, json!(false)).await?;
        tracing::info!(key = %limit_key, limit_minutes = extended, "limit extended");
        Ok(extended)
    }
}

#[cfg(test)]
#[path = "tests/accounting_tests.rs"]
mod tests;
