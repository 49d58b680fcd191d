//! Tracing setup for the `halo` binary.
//!
//! Human-readable output goes to stderr; the same events are appended to a
//! daily-rolling file under `~/.halo/logs/`. `RUST_LOG` overrides the level.

use anyhow::Result;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the file writer flushing for the lifetime of the process.
static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "halo=debug,halo_ledger=debug"
    } else {
        "info"
    }
}

pub fn init(verbose: bool) -> Result<()> {
    let log_dir = crate::paths::logs_dir()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("halo")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    Ok(())
}
