//! UI actions. Every state change in the dashboard goes through one.

use tankwatch_core::MonitorSnapshot;

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Render,
    Resize(u16, u16),

    // ── Monitor ───────────────────────────────────────────────────
    Snapshot(Box<MonitorSnapshot>),
    MonitorStopped,

    // ── Overlays ──────────────────────────────────────────────────
    ToggleHelp,
}
