//! Derived block state for the presentation layer.
//!
//! The presentation layer owns nothing: it reads the three ledger flags,
//! decides which block screen (if any) to show, and re-evaluates whenever the
//! store reports a change, the page changes, or a refresh tick fires.

use crate::ledger::{self, Key, UsageLedger};
use crate::messages::Message;
use crate::store::{KeyValueStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Why the page is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockReason {
    Paused,
    DailyLimit,
    ShortsLimit,
}

impl BlockReason {
    pub fn title(self) -> &'static str {
        match self {
            BlockReason::Paused => "YouTube Paused",
            BlockReason::ShortsLimit => "Shorts Limit Reached",
            BlockReason::DailyLimit => "Time for a break?",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            BlockReason::Paused => "You paused YouTube manually.",
            BlockReason::ShortsLimit => "You've reached your Shorts limit for today.",
            BlockReason::DailyLimit => {
                "You've reached your daily limit. Great job sticking to your goals."
            }
        }
    }

    /// The "5 more minutes" action offered by the block screen. A pause
    /// offers none; it is lifted from the settings instead.
    pub fn extend_action(self) -> Option<Message> {
        match self {
            BlockReason::Paused => None,
            BlockReason::DailyLimit => Some(Message::ExtendTime),
            BlockReason::ShortsLimit => Some(Message::ExtendShortsTime),
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::Paused => f.write_str("paused"),
            BlockReason::DailyLimit => f.write_str("daily-limit"),
            BlockReason::ShortsLimit => f.write_str("shorts-limit"),
        }
    }
}

/// The ledger flags that drive blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockFlags {
    pub is_paused: bool,
    pub is_blocked: bool,
    pub is_shorts_blocked: bool,
}

impl BlockFlags {
    pub async fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            is_paused: ledger::read_bool(store, Key::IsPaused).await?,
            is_blocked: ledger::read_bool(store, Key::IsBlocked).await?,
            is_shorts_blocked: ledger::read_bool(store, Key::IsShortsBlocked).await?,
        })
    }
}

impl From<&UsageLedger> for BlockFlags {
    fn from(ledger: &UsageLedger) -> Self {
        Self {
            is_paused: ledger.is_paused,
            is_blocked: ledger.is_blocked,
            is_shorts_blocked: ledger.is_shorts_blocked,
        }
    }
}

/// Picks the block screen: pause, then daily limit, then the short-form
/// limit (only while on a short-form page).
pub fn evaluate(flags: &BlockFlags, on_short_form_page: bool) -> Option<BlockReason> {
    if flags.is_paused {
        Some(BlockReason::Paused)
    } else if flags.is_blocked {
        Some(BlockReason::DailyLimit)
    } else if flags.is_shorts_blocked && on_short_form_page {
        Some(BlockReason::ShortsLimit)
    } else {
        None
    }
}

/// Keeps a derived block state up to date.
pub struct BlockMonitor {
    state: watch::Receiver<Option<BlockReason>>,
    _task: JoinHandle<()>,
}

impl BlockMonitor {
    /// Starts monitoring `store`.
    ///
    /// `on_short_form_page` carries whether the current page is a short-form
    /// page; every change to it counts as a navigation. The state is also
    /// recomputed every `refresh` interval, which covers writes made by other
    /// processes that never reach this process's change subscription.
    pub fn spawn<S>(
        store: Arc<S>,
        mut on_short_form_page: watch::Receiver<bool>,
        refresh: Duration,
    ) -> Self
    where
        S: KeyValueStore + ?Sized + 'static,
    {
        let (state_tx, state_rx) = watch::channel(None);
        let mut changes = store.subscribe();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut navigation_open = true;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    change = changes.recv() => match change {
                        Ok(change) => {
                            let relevant = Key::from_name(&change.key)
                                .is_some_and(Key::affects_block_state);
                            if !relevant {
                                continue;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "block monitor lagged behind store changes");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    changed = on_short_form_page.changed(), if navigation_open => {
                        if changed.is_err() {
                            navigation_open = false;
                            continue;
                        }
                    }
                    _ = state_tx.closed() => break,
                }

                let on_shorts = *on_short_form_page.borrow();
                match BlockFlags::load(store.as_ref()).await {
                    Ok(flags) => {
                        let next = evaluate(&flags, on_shorts);
                        state_tx.send_if_modified(|current| {
                            if *current == next {
                                return false;
                            }
                            tracing::info!(from = ?*current, to = ?next, "block state changed");
                            *current = next;
                            true
                        });
                    }
                    Err(e) => {
                        tracing::warn!("failed to read block flags, keeping previous state: {}", e);
                    }
                }
            }
        });

        Self {
            state: state_rx,
            _task: task,
        }
    }

    /// Current block state.
    pub fn current(&self) -> Option<BlockReason> {
        *self.state.borrow()
    }

    /// A receiver that is notified on every block state change.
    pub fn subscribe(&self) -> watch::Receiver<Option<BlockReason>> {
        self.state.clone()
    }
}

/// What the popup's home view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub ledger: UsageLedger,
    pub daily_remaining: String,
    pub shorts_remaining: String,
    pub block: Option<BlockReason>,
}

impl StatusSummary {
    pub async fn load<S: KeyValueStore + ?Sized>(
        store: &S,
        on_short_form_page: bool,
    ) -> Result<Self, StoreError> {
        let ledger = UsageLedger::load(store).await?;
        Ok(Self::from_ledger(ledger, on_short_form_page))
    }

    pub fn from_ledger(ledger: UsageLedger, on_short_form_page: bool) -> Self {
        let block = evaluate(&BlockFlags::from(&ledger), on_short_form_page);
        Self {
            daily_remaining: format_remaining(Duration::from_secs(
                ledger.daily_remaining_seconds(),
            )),
            shorts_remaining: format_remaining(Duration::from_secs(
                ledger.shorts_remaining_seconds(),
            )),
            block,
            ledger,
        }
    }
}

impl std::fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let l = &self.ledger;
        writeln!(
            f,
            "Daily:  {} remaining ({}s of {}m used){}",
            self.daily_remaining,
            l.daily_usage_seconds,
            l.daily_limit_minutes,
            if l.is_blocked { " [blocked]" } else { "" }
        )?;
        writeln!(
            f,
            "Shorts: {} remaining ({}s of {}m used){}",
            self.shorts_remaining,
            l.shorts_usage_seconds,
            l.shorts_limit_minutes,
            if l.is_shorts_blocked { " [blocked]" } else { "" }
        )?;
        if l.is_paused {
            writeln!(f, "Paused")?;
        }
        match self.block {
            Some(reason) => write!(f, "Block:  {} - {}", reason.title(), reason.message()),
            None => write!(f, "Block:  none"),
        }
    }
}

/// Formats remaining time as `"1h 20m"`, `"45m"` or `"0m"`.
///
/// Hours are shown only when at least one hour remains; seconds are dropped.
pub fn format_remaining(remaining: Duration) -> String {
    let total_secs = remaining.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
