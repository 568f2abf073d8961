//! The dashboard: everything the operator sees, drawn from the latest
//! monitor snapshot.
//!
//! ┌─ Tank ─┐ ┌─ Level ──────────────────────────────┐
//! │  ░░░░  │ │ ██████████████ 64% ░░░░░░░░░░░░░░░░░ │
//! │  ████  │ └──────────────────────────────────────┘
//! │  ████  │ ┌─ Details ────────────────────────────┐
//! │  ████  │ │ band, thresholds, last event          │
//! │  ████  │ └──────────────────────────────────────┘
//! │  ████  │ ┌─ History ────────────────────────────┐
//! │  ████  │ │ sparkline of recent readings          │
//! └────────┘ └──────────────────────────────────────┘
//!  ● live   order Idle   placed 0          q quit  ? help

use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Sparkline};

use tankwatch_core::{GaugeView, MonitorSnapshot, ReorderPhase, Thresholds, Toast};

use crate::theme;
use crate::widgets::fill_bar::FillBar;

/// Readings kept for the history sparkline.
const HISTORY_LEN: usize = 240;

pub struct Dashboard {
    snapshot: MonitorSnapshot,
    thresholds: Thresholds,
    station: Option<u64>,
    history: VecDeque<u64>,
    last_reading: Option<u64>,
    monitor_stopped: bool,
}

impl Dashboard {
    pub fn new(thresholds: Thresholds, station: Option<u64>) -> Self {
        Self {
            snapshot: MonitorSnapshot::default(),
            thresholds,
            station,
            history: VecDeque::with_capacity(HISTORY_LEN),
            last_reading: None,
            monitor_stopped: false,
        }
    }

    /// Take a new snapshot; records a history point whenever the reading
    /// counter moves (or on the very first snapshot).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    pub fn apply(&mut self, snapshot: MonitorSnapshot) {
        if self.last_reading != Some(snapshot.readings) {
            self.last_reading = Some(snapshot.readings);
            if self.history.len() == HISTORY_LEN {
                self.history.pop_front();
            }
            self.history.push_back(snapshot.level.value().round() as u64);
        }
        self.snapshot = snapshot;
    }

    pub fn mark_stopped(&mut self) {
        self.monitor_stopped = true;
    }

    pub fn snapshot(&self) -> &MonitorSnapshot {
        &self.snapshot
    }

    pub fn render(&self, frame: &mut Frame, help_visible: bool) {
        let area = frame.area();
        let [content, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
        let [tank, right] =
            Layout::horizontal([Constraint::Length(10), Constraint::Min(20)]).areas(content);
        let [level, details, history] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(3),
        ])
        .areas(right);

        let view = GaugeView::new(self.snapshot.level, &self.thresholds);

        frame.render_widget(FillBar::new(view).block(panel(" Tank ")), tank);
        self.render_gauge(frame, level, &view);
        self.render_details(frame, details, &view);
        self.render_history(frame, history);
        self.render_status_bar(frame, status);

        if let Some(ref toast) = self.snapshot.toast {
            render_toast(frame, area, toast);
        }
        if help_visible {
            render_help(frame, area);
        }
    }

    fn render_gauge(&self, frame: &mut Frame, area: Rect, view: &GaugeView) {
        let title = match self.station {
            Some(id) => format!(" Level · station {id} "),
            None => " Level · no station ".to_owned(),
        };
        let gauge = Gauge::default()
            .block(panel(title))
            .gauge_style(
                Style::default()
                    .fg(theme::band_color(view.band))
                    .bg(theme::BG_DARK),
            )
            .ratio(view.fill_ratio.clamp(0.0, 1.0))
            .label(Span::styled(
                view.percent.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        frame.render_widget(gauge, area);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect, view: &GaugeView) {
        let t = &self.thresholds;
        let band_style = Style::default()
            .fg(theme::band_color(view.band))
            .add_modifier(Modifier::BOLD);
        let last_event = self.snapshot.last_event.map_or_else(
            || "none yet".to_owned(),
            |e| format!("{} at {}", e.kind, e.reading.value),
        );

        let lines = vec![
            Line::from(vec![
                Span::styled("Band        ", theme::label()),
                Span::styled(view.band.to_string(), band_style),
            ]),
            Line::from(vec![
                Span::styled("Thresholds  ", theme::label()),
                Span::raw(format!(
                    "full >{}%  reorder ≤{}%  empty <{}%",
                    t.full, t.reorder, t.empty
                )),
            ]),
            Line::from(vec![
                Span::styled("Last event  ", theme::label()),
                Span::raw(last_event),
            ]),
            Line::from(vec![
                Span::styled("Readings    ", theme::label()),
                Span::raw(self.snapshot.readings.to_string()),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines).block(panel(" Details ")), area);
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let block = panel(" History ");
        let inner_width = usize::from(block.inner(area).width);
        let skip = self.history.len().saturating_sub(inner_width);
        let sparkline = Sparkline::default()
            .block(block)
            .max(100)
            .style(Style::default().fg(theme::NEON_CYAN))
            .data(self.history.iter().skip(skip).copied());
        frame.render_widget(sparkline, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (feed_text, feed_color) = if self.monitor_stopped {
            ("■ stopped", theme::ERROR_RED)
        } else {
            theme::feed_indicator(self.snapshot.feed)
        };
        let phase_color = match self.snapshot.phase {
            ReorderPhase::Idle => theme::DIM_WHITE,
            ReorderPhase::InFlight => theme::ELECTRIC_YELLOW,
            ReorderPhase::OrderPlaced => theme::SUCCESS_GREEN,
        };

        let line = Line::from(vec![
            Span::styled(format!(" {feed_text}"), Style::default().fg(feed_color)),
            Span::styled("   order ", theme::key_hint()),
            Span::styled(self.snapshot.phase.to_string(), Style::default().fg(phase_color)),
            Span::styled("   placed ", theme::key_hint()),
            Span::styled(
                self.snapshot.orders_placed.to_string(),
                Style::default().fg(theme::DIM_WHITE),
            ),
            Span::styled("   ", theme::key_hint()),
            Span::styled("q", theme::key_hint_key()),
            Span::styled(" quit  ", theme::key_hint()),
            Span::styled("?", theme::key_hint_key()),
            Span::styled(" help", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn panel<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .title(title)
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default())
}

/// Toast in the bottom-right corner, above the status bar.
fn render_toast(frame: &mut Frame, area: Rect, toast: &Toast) {
    let text_len = u16::try_from(toast.text.chars().count()).unwrap_or(u16::MAX);
    let width = text_len.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16.min(area.height);
    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 1);
    let toast_area = Rect::new(area.x + x, area.y + y, width, height);

    let (color, icon) = theme::severity_icon(toast.severity);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(toast.text.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);

    frame.render_widget(Clear, toast_area);
    frame.render_widget(Paragraph::new(line).block(block), toast_area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let width = 36u16.min(area.width);
    let height = 7u16.min(area.height);
    let help_area = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {k:<8}"), theme::key_hint_key()),
            Span::styled(desc, theme::label()),
        ])
    };
    let lines = vec![
        key("q Esc", "quit"),
        key("Ctrl-C", "quit"),
        key("?", "toggle this help"),
        Line::from(""),
        Line::from(Span::styled(
            "  Orders are placed automatically.",
            theme::key_hint(),
        )),
    ];

    frame.render_widget(Clear, help_area);
    frame.render_widget(
        Paragraph::new(lines).block(
            panel(" Keys ")
                .border_style(Style::default().fg(theme::ELECTRIC_PURPLE))
                .style(Style::default().bg(theme::BG_DARK)),
        ),
        help_area,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use tankwatch_core::{FeedStatus, Percent, Severity};
    use tokio::time::Instant;

    fn snapshot(level: f64, readings: u64) -> MonitorSnapshot {
        MonitorSnapshot {
            level: Percent::new(level).unwrap(),
            readings,
            feed: FeedStatus::Connected,
            ..MonitorSnapshot::default()
        }
    }

    fn draw(dashboard: &Dashboard, help: bool) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| dashboard.render(f, help)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer.cell((x, y)).unwrap().symbol().to_owned())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_level_station_and_status() {
        let mut dashboard = Dashboard::new(Thresholds::default(), Some(3));
        dashboard.apply(snapshot(64.0, 1));
        let screen = draw(&dashboard, false);

        assert!(screen.contains("64%"), "{screen}");
        assert!(screen.contains("station 3"), "{screen}");
        assert!(screen.contains("● live"), "{screen}");
        assert!(screen.contains("order Idle"), "{screen}");
        assert!(screen.contains("Normal"), "{screen}");
    }

    #[test]
    fn renders_toast_overlay() {
        let mut dashboard = Dashboard::new(Thresholds::default(), None);
        let mut snap = snapshot(95.0, 1);
        snap.toast = Some(Toast {
            text: "Tank is nearly full!".into(),
            severity: Severity::Info,
            created_at: Instant::now(),
        });
        dashboard.apply(snap);
        let screen = draw(&dashboard, false);

        assert!(screen.contains("Tank is nearly full!"), "{screen}");
        assert!(screen.contains("no station"), "{screen}");
    }

    #[test]
    fn renders_help_and_stopped_state() {
        let mut dashboard = Dashboard::new(Thresholds::default(), Some(1));
        dashboard.mark_stopped();
        let screen = draw(&dashboard, true);

        assert!(screen.contains("toggle this help"), "{screen}");
        assert!(screen.contains("stopped"), "{screen}");
    }

    #[test]
    fn history_records_one_point_per_reading() {
        let mut dashboard = Dashboard::new(Thresholds::default(), None);
        dashboard.apply(snapshot(50.0, 0));
        dashboard.apply(snapshot(50.0, 0));
        dashboard.apply(snapshot(25.0, 1));
        dashboard.apply(snapshot(18.4, 2));

        assert_eq!(dashboard.history.iter().copied().collect::<Vec<_>>(), vec![50, 25, 18]);
    }
}
