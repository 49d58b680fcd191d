//! Daily usage limits for a video-sharing site.
//!
//! Heartbeats from visible pages accumulate general and short-form usage in a
//! key-value ledger; reaching a cap raises a blocked flag that the
//! presentation layer turns into a block screen.

pub mod accounting;
pub mod clock;
pub mod config;
pub mod ledger;
pub mod logging;
pub mod messages;
pub mod paths;
pub mod preferences;
pub mod presentation;
pub mod settings;
pub mod store;
pub mod tracker;
