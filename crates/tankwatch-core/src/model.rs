// ── Level and threshold domain types ──

use tankwatch_api::Percent;

/// One accepted level sample. `sequence` is the arrival order within a
/// monitoring session, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    pub value: Percent,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ThresholdKind {
    Full,
    Empty,
    #[strum(to_string = "Reorder")]
    ReorderNeeded,
}

/// A reading that matched a threshold rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEvent {
    pub kind: ThresholdKind,
    pub reading: LevelReading,
    /// The reading also satisfied the reorder rule. Set on `Empty` events
    /// when the level fell from above the reorder point straight past `empty`.
    pub crossed_reorder: bool,
}

impl ThresholdEvent {
    /// Whether this event should start an automatic order.
    pub fn needs_reorder(&self) -> bool {
        self.kind == ThresholdKind::ReorderNeeded || self.crossed_reorder
    }
}
