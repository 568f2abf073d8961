//! Live monitor: feed + monitor task, rendered as a line log.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use tankwatch_api::LevelFeed;
use tankwatch_config::Config;
use tankwatch_core::{GaugeView, Monitor, MonitorSnapshot, ReorderPhase, Thresholds};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::build_client;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let client = Arc::new(build_client(cfg)?);

    let feed_url = match args.feed_url {
        Some(raw) => Url::parse(&raw).map_err(|e| CliError::Validation {
            field: "feed-url".into(),
            reason: e.to_string(),
        })?,
        None => cfg.feed_url()?,
    };

    let identity = tankwatch_config::load_session()?;
    if identity.station.is_none() || identity.email.as_deref().is_none_or(|e| e.trim().is_empty()) {
        eprintln!(
            "warning: station identity incomplete, automatic orders will be refused \
             (set it with: tankwatch session set --station <id> --email <addr>)"
        );
    }

    let mut monitor_cfg = cfg.monitor_config(identity);
    if let Some(mode) = args.trigger_mode {
        monitor_cfg.trigger_mode = mode;
    }
    let thresholds = monitor_cfg.thresholds;

    let cancel = CancellationToken::new();
    let feed = LevelFeed::connect(feed_url.clone(), cfg.reconnect(), cancel.child_token());
    let monitor = Monitor::new(monitor_cfg, Arc::clone(&client), client);
    let snapshots = monitor.subscribe();
    let monitor_task = tokio::spawn(monitor.run(feed.subscribe(), cancel.child_token()));

    tracing::info!(%feed_url, "watching tank level");
    if !global.quiet && global.output == OutputFormat::Table {
        eprintln!("Watching {feed_url} (Ctrl-C to stop)");
    }

    let mut printer = Printer::new(global, thresholds);
    follow(snapshots, &mut printer, &cancel).await;

    cancel.cancel();
    feed.shutdown();
    if let Err(e) = monitor_task.await {
        tracing::warn!(error = %e, "monitor task ended abnormally");
    }
    Ok(())
}

/// Print snapshots until Ctrl-C or the monitor goes away.
async fn follow(
    mut snapshots: watch::Receiver<MonitorSnapshot>,
    printer: &mut Printer,
    cancel: &CancellationToken,
) {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::debug!("interrupt received");
                cancel.cancel();
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                printer.print(&snapshot);
            }
        }
    }
}

// ── Rendering ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct SnapshotLine<'a> {
    time: String,
    level: f64,
    band: String,
    feed: String,
    phase: String,
    orders_placed: u32,
    event: Option<String>,
    toast: Option<ToastLine<'a>>,
}

#[derive(Serialize)]
struct ToastLine<'a> {
    severity: String,
    text: &'a str,
}

/// Tracks what has already been printed so a snapshot only emits what changed.
struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
    thresholds: Thresholds,
    readings: Option<u64>,
    toast: Option<String>,
    phase: ReorderPhase,
    feed: Option<String>,
}

impl Printer {
    fn new(global: &GlobalOpts, thresholds: Thresholds) -> Self {
        Self {
            format: global.output,
            color: output::should_color(global.color),
            quiet: global.quiet,
            thresholds,
            readings: None,
            toast: None,
            phase: ReorderPhase::Idle,
            feed: None,
        }
    }

    fn print(&mut self, snap: &MonitorSnapshot) {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonCompact => self.print_json(snap),
            OutputFormat::Table | OutputFormat::Plain => {
                for line in self.lines(snap) {
                    output::print_output(&line, self.quiet);
                }
            }
        }
    }

    fn print_json(&self, snap: &MonitorSnapshot) {
        let view = GaugeView::new(snap.level, &self.thresholds);
        let line = SnapshotLine {
            time: Local::now().to_rfc3339(),
            level: snap.level.value(),
            band: view.band.to_string(),
            feed: snap.feed.to_string(),
            phase: snap.phase.to_string(),
            orders_placed: snap.orders_placed,
            event: snap.last_event.map(|e| e.kind.to_string()),
            toast: snap.toast.as_ref().map(|t| ToastLine {
                severity: t.severity.to_string(),
                text: &t.text,
            }),
        };
        match output::render_json(&line, true) {
            Ok(text) => output::print_output(&text, self.quiet),
            Err(e) => tracing::warn!(error = %e, "failed to render snapshot"),
        }
    }

    /// Text lines for whatever changed since the previous snapshot.
    fn lines(&mut self, snap: &MonitorSnapshot) -> Vec<String> {
        let mut lines = Vec::new();
        let time = Local::now().format("%H:%M:%S");

        let feed = snap.feed.to_string();
        if self.feed.as_ref() != Some(&feed) {
            if self.format == OutputFormat::Table {
                lines.push(format!("{time}  feed    {feed}"));
            }
            self.feed = Some(feed);
        }

        if self.readings != Some(snap.readings) {
            self.readings = Some(snap.readings);
            lines.push(match self.format {
                OutputFormat::Plain => snap.level.value().to_string(),
                _ => {
                    let view = GaugeView::new(snap.level, &self.thresholds);
                    format!("{time}  {}  {}", output::level_bar(&view, self.color), view.band)
                }
            });
        }

        let toast = snap.toast.as_ref().map(|t| t.text.clone());
        if toast != self.toast {
            if let Some(t) = &snap.toast {
                if self.format == OutputFormat::Table {
                    lines.push(format!(
                        "{time}  {} {}",
                        output::severity_label(t.severity, self.color),
                        t.text
                    ));
                }
            }
            self.toast = toast;
        }

        if snap.phase != self.phase {
            if self.format == OutputFormat::Table {
                lines.push(format!("{time}  order   {}", snap.phase));
            }
            self.phase = snap.phase;
        }

        lines
    }
}
