//! `tankwatch-tui`: live terminal dashboard for a station's fuel tank.
//!
//! Runs the same monitor as `tankwatch watch` (push feed, thresholds,
//! automatic reorder) and draws its snapshots with ratatui: a level gauge,
//! a vertical tank bar, reading history, and toast notifications.
//!
//! Logs go to a file (default `/tmp/tankwatch-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod dashboard;
mod data_bridge;
mod event;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use tankwatch_api::{FuelApiClient, LevelFeed};
use tankwatch_config::Config;
use tankwatch_core::Monitor;

use crate::app::App;

/// Terminal dashboard for fuel-tank levels and automatic reorders.
#[derive(Parser, Debug)]
#[command(name = "tankwatch-tui", version, about)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, env = "TANKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Level service URL (overrides config)
    #[arg(long, env = "TANKWATCH_LEVEL_URL")]
    level_url: Option<String>,

    /// Order API URL (overrides config)
    #[arg(long, env = "TANKWATCH_API_URL")]
    api_url: Option<String>,

    /// Push channel URL (default: derived from the level service URL)
    #[arg(long, env = "TANKWATCH_FEED_URL")]
    feed_url: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/tankwatch-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Hold the returned guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tankwatch_tui={log_level},tankwatch_core={log_level},tankwatch_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("tankwatch-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut cfg = tankwatch_config::load_config(cli.config.as_deref())
        .wrap_err("failed to load configuration")?;
    if let Some(ref url) = cli.level_url {
        cfg.service.level_url.clone_from(url);
    }
    if let Some(ref url) = cli.api_url {
        cfg.service.api_url.clone_from(url);
    }
    if let Some(ref url) = cli.feed_url {
        cfg.service.feed_url = Some(url.clone());
    }
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let cfg = load_config(&cli)?;
    let identity = tankwatch_config::load_session().wrap_err("failed to read station session")?;
    let station = identity.station;
    let feed_url: Url = cfg.feed_url()?;

    info!(
        level_url = %cfg.service.level_url,
        %feed_url,
        station = ?station,
        "starting tankwatch-tui"
    );

    let client = Arc::new(FuelApiClient::new(cfg.endpoints()?, &cfg.transport())?);
    let cancel = CancellationToken::new();
    let feed = LevelFeed::connect(feed_url, cfg.reconnect(), cancel.child_token());

    let monitor_cfg = cfg.monitor_config(identity);
    let thresholds = monitor_cfg.thresholds;
    let monitor = Monitor::new(monitor_cfg, Arc::clone(&client), client);
    let snapshots = monitor.subscribe();
    let monitor_task = tokio::spawn(monitor.run(feed.subscribe(), cancel.child_token()));

    let mut app = App::new(thresholds, station);
    let result = app.run(snapshots, cancel.clone()).await;

    cancel.cancel();
    feed.shutdown();
    let _ = monitor_task.await;
    info!("tankwatch-tui stopped");
    result
}
