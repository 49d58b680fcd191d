//! Heartbeat source: turns "a tracked page is visible" into periodic heartbeats.

use crate::config::TrackerConfig;
use crate::messages::Message;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// What the user is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageState {
    pub host: String,
    pub path: String,
    /// Page is in the foreground.
    pub visible: bool,
}

impl PageState {
    pub fn new(host: impl Into<String>, path: impl Into<String>, visible: bool) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            visible,
        }
    }
}

/// Returns true if `path` is a short-form video page.
pub fn is_short_form_path(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix)
}

/// Returns true if `host` is one of `tracked` or a subdomain of one.
pub fn is_tracked_host(host: &str, tracked: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    tracked.iter().any(|t| {
        let t = t.to_ascii_lowercase();
        host == t || host.ends_with(&format!(".{}", t))
    })
}

/// Periodic heartbeat emitter.
pub struct HeartbeatSource {
    interval: Duration,
    tracked_hosts: Vec<String>,
    short_form_prefix: String,
}

impl HeartbeatSource {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            interval: config.heartbeat_interval(),
            tracked_hosts: config.tracked_hosts.clone(),
            short_form_prefix: config.short_form_prefix.clone(),
        }
    }

    /// The heartbeat the given page would emit, if any.
    pub fn heartbeat_for(&self, page: &PageState) -> Option<Message> {
        if !page.visible || !is_tracked_host(&page.host, &self.tracked_hosts) {
            return None;
        }
        Some(Message::Heartbeat {
            is_shorts: is_short_form_path(&page.path, &self.short_form_prefix),
        })
    }

    /// Spawns the timer. The first heartbeat is sent one interval after start.
    ///
    /// Stops when `tx` is closed.
    pub fn spawn(
        self,
        page: watch::Receiver<PageState>,
        tx: mpsc::UnboundedSender<Message>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }

                let current = page.borrow().clone();
                if let Some(message) = self.heartbeat_for(&current) {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
            }
            tracing::debug!("heartbeat source stopped");
        })
    }
}

#[cfg(test)]
#[path = "tests/tracker_tests.rs"]
mod tests;
