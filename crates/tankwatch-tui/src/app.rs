//! Application core: event loop, key handling, action dispatch.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tankwatch_core::{MonitorSnapshot, Thresholds};

use crate::action::Action;
use crate::dashboard::Dashboard;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::tui::Tui;

enum Incoming {
    Event(Event),
    Action(Action),
}

pub struct App {
    dashboard: Dashboard,
    running: bool,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(thresholds: Thresholds, station: Option<u64>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            dashboard: Dashboard::new(thresholds, station),
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
        }
    }

    /// Drive the terminal until the user quits. Cancels `cancel` on exit so
    /// the monitor and feed shut down with the UI.
    pub async fn run(
        &mut self,
        snapshots: watch::Receiver<MonitorSnapshot>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let bridge = tokio::spawn(spawn_data_bridge(
            snapshots,
            self.action_tx.clone(),
            cancel.child_token(),
        ));
        let mut events = EventReader::new(Duration::from_millis(100));

        info!("TUI event loop started");

        while self.running {
            let incoming = tokio::select! {
                event = events.next() => match event {
                    Some(event) => Incoming::Event(event),
                    None => break,
                },
                Some(action) = self.action_rx.recv() => Incoming::Action(action),
            };

            let mut next = match incoming {
                Incoming::Event(event) => self.map_event(event),
                Incoming::Action(action) => Some(action),
            };
            // Drain everything queued before waiting again.
            while let Some(action) = next.take().or_else(|| self.action_rx.try_recv().ok()) {
                let redraw = matches!(action, Action::Render | Action::Resize(..));
                self.process_action(action);
                if redraw {
                    tui.draw(|frame| self.dashboard.render(frame, self.help_visible))?;
                }
            }
        }

        events.stop();
        cancel.cancel();
        let _ = bridge.await;
        drop(tui);
        info!("TUI event loop ended");
        Ok(())
    }

    fn map_event(&self, event: Event) -> Option<Action> {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Resize(w, h) => Some(Action::Resize(w, h)),
            Event::Render => Some(Action::Render),
        }
    }

    fn handle_key_event(&self, key: KeyEvent) -> Option<Action> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q') | KeyCode::Esc) => Some(Action::Quit),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => {
                Some(Action::ToggleHelp)
            }
            _ => None,
        }
    }

    fn process_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Render | Action::Resize(..) => {}
            Action::Snapshot(snapshot) => self.dashboard.apply(*snapshot),
            Action::MonitorStopped => {
                debug!(
                    readings = self.dashboard.snapshot().readings,
                    "monitor stopped, keeping last snapshot on screen"
                );
                self.dashboard.mark_stopped();
            }
            Action::ToggleHelp => self.help_visible = !self.help_visible,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use tankwatch_core::{Percent, ReorderPhase};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        let mut key = KeyEvent::new(code, modifiers);
        key.kind = KeyEventKind::Press;
        key
    }

    fn app() -> App {
        App::new(Thresholds::default(), Some(3))
    }

    #[test]
    fn quit_keys() {
        let app = app();
        for k in [
            key(KeyCode::Char('q'), KeyModifiers::NONE),
            key(KeyCode::Esc, KeyModifiers::NONE),
            key(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert!(matches!(app.handle_key_event(k), Some(Action::Quit)));
        }
    }

    #[test]
    fn help_overlay_captures_esc() {
        let mut app = app();
        app.process_action(Action::ToggleHelp);
        assert!(app.help_visible);

        let action = app.handle_key_event(key(KeyCode::Esc, KeyModifiers::NONE));
        assert!(matches!(action, Some(Action::ToggleHelp)));
        app.process_action(action.unwrap());
        assert!(!app.help_visible);
    }

    #[test]
    fn snapshot_action_updates_dashboard() {
        let mut app = app();
        let snap = MonitorSnapshot {
            level: Percent::new(18.0).unwrap(),
            readings: 4,
            phase: ReorderPhase::InFlight,
            ..MonitorSnapshot::default()
        };
        app.process_action(Action::Snapshot(Box::new(snap)));

        assert_eq!(app.dashboard.snapshot().phase, ReorderPhase::InFlight);
        assert_eq!(app.dashboard.snapshot().readings, 4);
    }

    #[test]
    fn quit_action_stops_loop() {
        let mut app = app();
        app.process_action(Action::Quit);
        assert!(!app.running);
    }
}
