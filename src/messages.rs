//! Message surface of the accounting service.
//!
//! Pages and the block screen talk to the service with fire-and-forget
//! messages. The JSON shape is tagged by `type`:
//!
//! ```json
//! {"type":"HEARTBEAT","isShorts":true}
//! {"type":"EXTEND_TIME"}
//! {"type":"EXTEND_SHORTS_TIME"}
//! ```

use crate::accounting::{HeartbeatOutcome, UsageAccountingService};
use crate::clock::Clock;
use crate::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Another slice of time passed on a tracked page.
    Heartbeat {
        #[serde(rename = "isShorts", default)]
        is_shorts: bool,
    },
    /// Extend the general daily limit.
    ExtendTime,
    /// Extend the short-form limit.
    ExtendShortsTime,
}

impl Message {
    /// Parses one JSON message.
    pub fn parse(line: &str) -> Result<Message, serde_json::Error> {
        serde_json::from_str(line.trim())
    }
}

impl<S: KeyValueStore, C: Clock> UsageAccountingService<S, C> {
    /// Applies one message to the ledger.
    pub async fn handle(&self, message: Message) -> Result<(), StoreError> {
        match message {
            Message::Heartbeat { is_shorts } => {
                let outcome = self.record_heartbeat(is_shorts).await?;
                if outcome == HeartbeatOutcome::Debounced {
                    tracing::trace!("duplicate heartbeat dropped");
                }
            }
            Message::ExtendTime => {
                self.extend_general_time().await?;
            }
            Message::ExtendShortsTime => {
                self.extend_short_form_time().await?;
            }
        }
        Ok(())
    }
}

/// Spawns the background worker that applies messages in arrival order.
///
/// Failures are logged and dropped; the next message is processed normally.
/// The worker exits once every sender has been dropped.
pub fn spawn_background<S, C>(
    service: Arc<UsageAccountingService<S, C>>,
) -> (mpsc::UnboundedSender<Message>, JoinHandle<()>)
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = service.handle(message).await {
                tracing::warn!(?message, "failed to apply message: {}", e);
            }
        }
        tracing::debug!("message channel closed, background worker stopping");
    });

    (tx, task)
}

#[cfg(test)]
#[path = "tests/messages_tests.rs"]
mod tests;
