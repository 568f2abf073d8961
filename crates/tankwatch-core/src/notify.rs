// ── Transient notifications ──
//
// A single toast slot. Showing a toast replaces whatever is visible, so a
// burst of identical events never stacks up. Time is passed in explicitly;
// the monitor loop schedules a wake-up at `deadline()`.

use std::time::Duration;

use tokio::time::Instant;

use crate::model::ThresholdKind;

pub const FULL_MESSAGE: &str = "Tank is nearly full!";
pub const EMPTY_MESSAGE: &str = "Tank is almost empty!";
pub const ORDER_PLACED_MESSAGE: &str = "Order created successfully!";
pub const ORDER_FAILED_MESSAGE: &str = "Failed to create order";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Severity {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub severity: Severity,
    pub created_at: Instant,
}

/// Toast text for the threshold kinds that are announced directly.
/// Reorder events are announced through the order outcome instead.
pub fn threshold_toast(kind: ThresholdKind) -> Option<(&'static str, Severity)> {
    match kind {
        ThresholdKind::Full => Some((FULL_MESSAGE, Severity::Info)),
        ThresholdKind::Empty => Some((EMPTY_MESSAGE, Severity::Warning)),
        ThresholdKind::ReorderNeeded => None,
    }
}

#[derive(Debug, Clone)]
pub struct Toaster {
    current: Option<Toast>,
    duration: Duration,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DURATION)
    }
}

impl Toaster {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn show(&mut self, text: impl Into<String>, severity: Severity, now: Instant) -> &Toast {
        self.current.insert(Toast {
            text: text.into(),
            severity,
            created_at: now,
        })
    }

    /// The visible toast, if it has not outlived its duration at `now`.
    pub fn current(&self, now: Instant) -> Option<&Toast> {
        self.current
            .as_ref()
            .filter(|t| now < t.created_at + self.duration)
    }

    /// Drop the toast once expired. Returns `true` if one was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.current.is_some() && self.current(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }

    /// When the visible toast is due to disappear.
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|t| t.created_at + self.duration)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn show_replaces_current_toast() {
        let now = Instant::now();
        let mut toaster = Toaster::default();
        for _ in 0..5 {
            toaster.show(FULL_MESSAGE, Severity::Info, now);
        }
        toaster.show(EMPTY_MESSAGE, Severity::Warning, now);

        let toast = toaster.current(now).unwrap();
        assert_eq!(toast.text, EMPTY_MESSAGE);
        assert_eq!(toast.severity, Severity::Warning);
    }

    #[test]
    fn toast_expires_after_duration() {
        let now = Instant::now();
        let mut toaster = Toaster::new(Duration::from_millis(3000));
        toaster.show(ORDER_PLACED_MESSAGE, Severity::Success, now);

        assert!(toaster.current(now + Duration::from_millis(2999)).is_some());
        assert!(!toaster.expire(now + Duration::from_millis(2999)));

        let later = now + Duration::from_millis(3000);
        assert!(toaster.current(later).is_none());
        assert!(toaster.expire(later));
        assert_eq!(toaster.deadline(), None);
    }

    #[test]
    fn replacement_restarts_the_clock() {
        let start = Instant::now();
        let mut toaster = Toaster::new(Duration::from_millis(100));
        toaster.show(FULL_MESSAGE, Severity::Info, start);
        toaster.show(FULL_MESSAGE, Severity::Info, start + Duration::from_millis(80));

        assert_eq!(toaster.deadline(), Some(start + Duration::from_millis(180)));
        assert!(toaster.current(start + Duration::from_millis(150)).is_some());
    }

    #[test]
    fn reorder_has_no_direct_toast() {
        assert_eq!(threshold_toast(ThresholdKind::ReorderNeeded), None);
        assert_eq!(
            threshold_toast(ThresholdKind::Full),
            Some((FULL_MESSAGE, Severity::Info))
        );
    }
}
