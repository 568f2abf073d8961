// ── Threshold evaluation ──
//
// `classify` is the whole rule set; `ThresholdEvaluator` only adds the
// memory of the previous reading and the sequence counter.

use tankwatch_api::Percent;
use tracing::debug;

use crate::config::{Thresholds, TriggerMode};
use crate::model::{LevelReading, ThresholdEvent, ThresholdKind};

/// Classify one reading. Full and empty take precedence over the reorder
/// rule; both comparisons are strict, so a reading exactly at `full` or
/// `empty` is not an event.
pub fn classify(
    current: Percent,
    previous: Option<Percent>,
    thresholds: &Thresholds,
    mode: TriggerMode,
) -> Option<ThresholdKind> {
    let level = current.value();

    if level > thresholds.full {
        return Some(ThresholdKind::Full);
    }
    if level < thresholds.empty {
        return Some(ThresholdKind::Empty);
    }

    meets_reorder(current, previous, thresholds, mode).then_some(ThresholdKind::ReorderNeeded)
}

/// The reorder rule on its own, ignoring full/empty precedence.
pub fn meets_reorder(
    current: Percent,
    previous: Option<Percent>,
    thresholds: &Thresholds,
    mode: TriggerMode,
) -> bool {
    let level = current.value();
    match mode {
        TriggerMode::Crossing => {
            previous.is_some_and(|p| p.value() > thresholds.reorder) && level <= thresholds.reorder
        }
        TriggerMode::Exact => (level - thresholds.reorder).abs() < f64::EPSILON,
    }
}

/// Stateful wrapper around [`classify`] for a stream of readings.
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    thresholds: Thresholds,
    mode: TriggerMode,
    previous: Option<Percent>,
    sequence: u64,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: Thresholds, mode: TriggerMode) -> Self {
        Self {
            thresholds,
            mode,
            previous: None,
            sequence: 0,
        }
    }

    /// Record a level as the previous reading without classifying it.
    pub fn seed(&mut self, level: Percent) {
        self.previous = Some(level);
    }

    /// Classify `level` against the previous reading, then remember it.
    pub fn observe(&mut self, level: Percent) -> (LevelReading, Option<ThresholdEvent>) {
        self.sequence += 1;
        let reading = LevelReading {
            value: level,
            sequence: self.sequence,
        };
        let kind = classify(level, self.previous, &self.thresholds, self.mode);
        let crossed_reorder = meets_reorder(level, self.previous, &self.thresholds, self.mode);
        self.previous = Some(level);

        if let Some(kind) = kind {
            debug!(
                level = level.value(),
                sequence = reading.sequence,
                %kind,
                crossed_reorder,
                "threshold event"
            );
        }
        let event = kind.map(|kind| ThresholdEvent {
            kind,
            reading,
            crossed_reorder,
        });
        (reading, event)
    }

    pub fn previous(&self) -> Option<Percent> {
        self.previous
    }

    pub fn is_seeded(&self) -> bool {
        self.previous.is_some()
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pct(v: f64) -> Percent {
        Percent::new(v).unwrap()
    }

    fn crossing(current: f64, previous: Option<f64>) -> Option<ThresholdKind> {
        classify(
            pct(current),
            previous.map(pct),
            &Thresholds::default(),
            TriggerMode::Crossing,
        )
    }

    #[test]
    fn full_and_empty_ignore_history() {
        for previous in [None, Some(0.0), Some(50.0), Some(100.0)] {
            assert_eq!(crossing(95.0, previous), Some(ThresholdKind::Full));
            assert_eq!(crossing(5.0, previous), Some(ThresholdKind::Empty));
        }
    }

    #[test]
    fn boundaries_are_strict() {
        assert_eq!(crossing(90.0, Some(50.0)), None);
        assert_eq!(crossing(10.0, Some(50.0)), None);
        assert_eq!(crossing(90.5, Some(50.0)), Some(ThresholdKind::Full));
        assert_eq!(crossing(9.9, Some(50.0)), Some(ThresholdKind::Empty));
    }

    #[test]
    fn reorder_requires_downward_crossing() {
        assert_eq!(crossing(15.0, Some(25.0)), Some(ThresholdKind::ReorderNeeded));
        assert_eq!(crossing(20.0, Some(20.5)), Some(ThresholdKind::ReorderNeeded));
        assert_eq!(crossing(15.0, Some(5.0)), None);
        assert_eq!(crossing(15.0, Some(18.0)), None);
        assert_eq!(crossing(20.0, Some(20.0)), None);
        assert_eq!(crossing(25.0, Some(15.0)), None);
    }

    #[test]
    fn no_previous_means_no_crossing() {
        assert_eq!(crossing(20.0, None), None);
        assert_eq!(crossing(15.0, None), None);
    }

    #[test]
    fn crossing_below_empty_reports_empty() {
        assert_eq!(crossing(5.0, Some(25.0)), Some(ThresholdKind::Empty));
    }

    #[test]
    fn drop_past_empty_still_needs_reorder() {
        let mut evaluator = ThresholdEvaluator::new(Thresholds::default(), TriggerMode::Crossing);
        evaluator.seed(pct(25.0));

        let event = evaluator.observe(pct(5.0)).1.unwrap();
        assert_eq!(event.kind, ThresholdKind::Empty);
        assert!(event.crossed_reorder);
        assert!(event.needs_reorder());

        // Already below the reorder point: empty again, no new crossing.
        let event = evaluator.observe(pct(4.0)).1.unwrap();
        assert_eq!(event.kind, ThresholdKind::Empty);
        assert!(!event.needs_reorder());
    }

    #[test]
    fn exact_mode_matches_equality_only() {
        let t = Thresholds::default();
        let exact = |v: f64, p: Option<f64>| classify(pct(v), p.map(pct), &t, TriggerMode::Exact);

        assert_eq!(exact(20.0, None), Some(ThresholdKind::ReorderNeeded));
        assert_eq!(exact(20.0, Some(20.0)), Some(ThresholdKind::ReorderNeeded));
        assert_eq!(exact(19.5, Some(25.0)), None);
        assert_eq!(exact(20.5, Some(25.0)), None);
    }

    #[test]
    fn classify_is_pure() {
        let first = crossing(15.0, Some(25.0));
        let second = crossing(15.0, Some(25.0));
        assert_eq!(first, second);
    }

    #[test]
    fn depletion_scenario() {
        let mut evaluator = ThresholdEvaluator::new(Thresholds::default(), TriggerMode::Crossing);
        let kinds: Vec<_> = [50.0, 25.0, 20.0, 18.0, 12.0, 8.0]
            .into_iter()
            .map(|v| evaluator.observe(pct(v)).1.map(|e| e.kind))
            .collect();

        assert_eq!(
            kinds,
            vec![
                None,
                None,
                Some(ThresholdKind::ReorderNeeded),
                None,
                None,
                Some(ThresholdKind::Empty),
            ]
        );
    }

    #[test]
    fn sequence_numbers_follow_arrival() {
        let mut evaluator = ThresholdEvaluator::new(Thresholds::default(), TriggerMode::Crossing);
        let (a, _) = evaluator.observe(pct(40.0));
        let (b, _) = evaluator.observe(pct(41.0));
        assert_eq!((a.sequence, b.sequence), (1, 2));
    }

    #[test]
    fn seed_enables_first_crossing() {
        let mut evaluator = ThresholdEvaluator::new(Thresholds::default(), TriggerMode::Crossing);
        assert!(!evaluator.is_seeded());
        evaluator.seed(pct(25.0));

        let (reading, event) = evaluator.observe(pct(20.0));
        assert_eq!(reading.sequence, 1);
        assert_eq!(event.map(|e| e.kind), Some(ThresholdKind::ReorderNeeded));
    }
}
