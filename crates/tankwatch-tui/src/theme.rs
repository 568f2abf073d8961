//! Palette and semantic styles for the dashboard.

use ratatui::style::{Color, Modifier, Style};

use tankwatch_core::{Band, FeedStatus, Severity};

// ── Palette ───────────────────────────────────────────────────────────

pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363
pub const LIGHT_BLUE: Color = Color::Rgb(139, 233, 253); // #8be9fd

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29
pub const EMPTY_CELL: Color = Color::Rgb(52, 55, 70);

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

pub fn label() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Fill color for a gauge band.
pub fn band_color(band: Band) -> Color {
    match band {
        Band::Critical => ERROR_RED,
        Band::Low => ELECTRIC_YELLOW,
        Band::Normal => SUCCESS_GREEN,
        Band::High => LIGHT_BLUE,
    }
}

/// Border color and icon for a toast.
pub fn severity_icon(severity: Severity) -> (Color, &'static str) {
    match severity {
        Severity::Success => (SUCCESS_GREEN, "✓"),
        Severity::Error => (ERROR_RED, "✗"),
        Severity::Warning => (ELECTRIC_YELLOW, "!"),
        Severity::Info => (NEON_CYAN, "·"),
    }
}

/// Status dot for the push channel.
pub fn feed_indicator(status: FeedStatus) -> (&'static str, Color) {
    match status {
        FeedStatus::Connected => ("● live", SUCCESS_GREEN),
        FeedStatus::Connecting => ("◐ connecting", ELECTRIC_YELLOW),
        FeedStatus::Disconnected => ("○ disconnected", ERROR_RED),
    }
}
