//! One-shot level fetch.

use serde::Serialize;

use tankwatch_config::Config;
use tankwatch_core::GaugeView;

use crate::cli::GlobalOpts;
use crate::config::build_client;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct LevelReport {
    level: f64,
    band: String,
    full: f64,
    empty: f64,
    reorder: f64,
}

pub async fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let client = build_client(cfg)?;
    let level = client.fetch_level().await?;

    let thresholds = cfg.thresholds();
    let view = GaugeView::new(level, &thresholds);
    let report = LevelReport {
        level: level.value(),
        band: view.band.to_string(),
        full: thresholds.full,
        empty: thresholds.empty,
        reorder: thresholds.reorder,
    };

    let color = output::should_color(global.color);
    let rendered = output::render_single(
        global.output,
        &report,
        |r| format!("{}  {}", output::level_bar(&view, color), r.band),
        |r| r.level.to_string(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
