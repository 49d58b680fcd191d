use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use halo_ledger::accounting::{HeartbeatOutcome, UsageAccountingService};
use halo_ledger::config::AppConfig;
use halo_ledger::messages::{spawn_background, Message};
use halo_ledger::presentation::{BlockMonitor, BlockReason, StatusSummary};
use halo_ledger::store::FileStore;
use halo_ledger::tracker::{is_short_form_path, HeartbeatSource, PageState};
use halo_ledger::{logging, paths, preferences, settings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "halo")]
#[command(about = "Daily time limits for a video-sharing site")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("HALO_GIT_SHA"), ")"))]
struct Cli {
    /// Configuration file (defaults to ~/.halo/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store document (overrides the configured storage path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write default settings that are not yet present
    Init,
    /// Record one heartbeat
    Heartbeat {
        /// The current page is a short-form video
        #[arg(long)]
        shorts: bool,
    },
    /// Add five minutes to the daily limit and lift the daily block
    Extend,
    /// Add five minutes to the shorts limit and lift the shorts block
    ExtendShorts,
    /// Block everything until resumed
    Pause,
    /// Lift a manual pause
    Resume,
    /// Change the daily and/or shorts limit (minutes)
    Limit {
        #[arg(long)]
        daily: Option<u64>,
        #[arg(long)]
        shorts: Option<u64>,
    },
    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsCommand>,
    },
    /// Show usage, remaining time and the block screen for a page
    Status {
        /// Page path used to decide whether the shorts block applies
        #[arg(long, default_value = "/")]
        page: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Apply JSON messages read line by line from stdin
    Serve,
    /// Track a page: emit heartbeats and report block changes.
    ///
    /// Each stdin line navigates to a new path; `hide` and `show` toggle
    /// page visibility.
    Track {
        #[arg(long, default_value = "www.youtube.com")]
        host: String,
        /// Initial page path
        #[arg(long, default_value = "/")]
        page: String,
    },
}

#[derive(Subcommand)]
enum PrefsCommand {
    Show,
    HideShorts {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    ScrollLimitActive {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    ScrollLimit {
        count: u64,
    },
    RestoreDislikes {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    ToggleTheme,
    /// Restore limits and preferences to their defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("[halo] Warning: Failed to initialize logging: {}", e);
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => paths::config_path()?,
    };
    let config = AppConfig::load_or_default(&config_path)?;

    let store_path = match cli.store.clone().or_else(|| config.storage_path.clone()) {
        Some(path) => path,
        None => paths::storage_path()?,
    };
    let store = Arc::new(FileStore::new(store_path));
    tracing::debug!(store = %store.path().display(), "using store");

    run(cli.command, config, store).await
}

async fn run(command: Command, config: AppConfig, store: Arc<FileStore>) -> Result<()> {
    let service = Arc::new(UsageAccountingService::new(
        store.clone(),
        config.accounting.clone(),
    ));

    match command {
        Command::Init => {
            let written = settings::install_defaults(store.as_ref()).await?;
            if written.is_empty() {
                println!("All settings already present");
            } else {
                let names: Vec<&str> = written.iter().map(|k| k.as_str()).collect();
                println!("Initialized: {}", names.join(", "));
            }
        }
        Command::Heartbeat { shorts } => {
            match service.record_heartbeat(shorts).await? {
                HeartbeatOutcome::Debounced => println!("Heartbeat dropped (too soon)"),
                HeartbeatOutcome::DayRolledOver { today } => {
                    println!("New day {}: usage reset", today)
                }
                HeartbeatOutcome::Paused => println!("Paused: nothing counted"),
                HeartbeatOutcome::Counted(tick) => {
                    if let Some(daily) = tick.daily_usage_seconds {
                        println!("Daily usage: {}s", daily);
                    }
                    if let Some(shorts) = tick.shorts_usage_seconds {
                        println!("Shorts usage: {}s", shorts);
                    }
                    if tick.daily_limit_reached {
                        println!("Daily limit reached");
                    }
                    if tick.shorts_limit_reached {
                        println!("Shorts limit reached");
                    }
                }
            }
        }
        Command::Extend => {
            let limit = service.extend_general_time().await?;
            println!("Daily limit is now {}m", limit);
        }
        Command::ExtendShorts => {
            let limit = service.extend_short_form_time().await?;
            println!("Shorts limit is now {}m", limit);
        }
        Command::Pause => {
            preferences::set_paused(store.as_ref(), true).await?;
            println!("Paused");
        }
        Command::Resume => {
            preferences::set_paused(store.as_ref(), false).await?;
            println!("Resumed");
        }
        Command::Limit { daily, shorts } => {
            if daily.is_none() && shorts.is_none() {
                anyhow::bail!("Pass --daily and/or --shorts");
            }
            if let Some(minutes) = daily {
                let stored = preferences::set_daily_limit(store.as_ref(), minutes).await?;
                println!("Daily limit set to {}m", stored);
            }
            if let Some(minutes) = shorts {
                let stored = preferences::set_shorts_limit(store.as_ref(), minutes).await?;
                println!("Shorts limit set to {}m", stored);
            }
        }
        Command::Prefs { action } => run_prefs(action.unwrap_or(PrefsCommand::Show), &store).await?,
        Command::Status { page, json } => {
            let on_shorts = is_short_form_path(&page, &config.tracker.short_form_prefix);
            let summary = StatusSummary::load(store.as_ref(), on_shorts).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }
        }
        Command::Serve => {
            settings::install_defaults(store.as_ref()).await?;
            let (tx, worker) = spawn_background(service);

            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                match Message::parse(&line) {
                    Ok(message) => {
                        if tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("skipping unparseable message {:?}: {}", line, e),
                }
            }

            drop(tx);
            worker.await.context("background worker panicked")?;
        }
        Command::Track { host, page } => run_track(config, store, service, host, page).await?,
    }

    Ok(())
}

async fn run_prefs(action: PrefsCommand, store: &Arc<FileStore>) -> Result<()> {
    let store = store.as_ref();
    match action {
        PrefsCommand::Show => {
            let prefs = preferences::Preferences::load(store).await?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        PrefsCommand::HideShorts { enabled } => preferences::set_hide_shorts(store, enabled).await?,
        PrefsCommand::ScrollLimitActive { enabled } => {
            preferences::set_scroll_limit_active(store, enabled).await?
        }
        PrefsCommand::ScrollLimit { count } => {
            let stored = preferences::set_scroll_limit_count(store, count).await?;
            println!("Scroll limit set to {}", stored);
        }
        PrefsCommand::RestoreDislikes { enabled } => {
            preferences::set_restore_dislikes(store, enabled).await?
        }
        PrefsCommand::ToggleTheme => {
            let theme = preferences::toggle_theme(store).await?;
            println!("Theme: {}", theme);
        }
        PrefsCommand::Reset => {
            preferences::reset_preferences(store).await?;
            println!("Preferences reset");
        }
    }
    Ok(())
}

async fn run_track(
    config: AppConfig,
    store: Arc<FileStore>,
    service: Arc<UsageAccountingService<Arc<FileStore>>>,
    host: String,
    path: String,
) -> Result<()> {
    settings::install_defaults(store.as_ref()).await?;

    let prefix = config.tracker.short_form_prefix.clone();
    let (page_tx, page_rx) = watch::channel(PageState::new(host, path.clone(), true));
    let (shorts_tx, shorts_rx) = watch::channel(is_short_form_path(&path, &prefix));

    let (tx, worker) = spawn_background(service);
    let source = HeartbeatSource::new(&config.tracker).spawn(page_rx, tx);
    let monitor = BlockMonitor::spawn(store, shorts_rx, config.presentation.refresh_interval());
    let mut block_rx = monitor.subscribe();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = block_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                report_block(*block_rx.borrow_and_update());
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => navigate(line.trim(), &page_tx, &shorts_tx, &prefix),
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    source.abort();
    let _ = worker.await;
    Ok(())
}

fn navigate(
    input: &str,
    page_tx: &watch::Sender<PageState>,
    shorts_tx: &watch::Sender<bool>,
    prefix: &str,
) {
    match input {
        "" => {}
        "hide" => page_tx.send_modify(|page| page.visible = false),
        "show" => page_tx.send_modify(|page| page.visible = true),
        path => {
            page_tx.send_modify(|page| page.path = path.to_string());
            let _ = shorts_tx.send(is_short_form_path(path, prefix));
            tracing::info!(path, "navigated");
        }
    }
}

fn report_block(state: Option<BlockReason>) {
    match state {
        Some(reason) => {
            println!("[blocked] {}: {}", reason.title(), reason.message());
            if reason.extend_action().is_some() {
                let command = if reason == BlockReason::ShortsLimit {
                    "halo extend-shorts"
                } else {
                    "halo extend"
                };
                println!("          5 more minutes: {}", command);
            }
        }
        None => println!("[unblocked]"),
    }
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
