// Presentation model for the level gauge. Frontends pick colors per band.

use tankwatch_api::Percent;

use crate::config::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Band {
    /// Below the empty threshold.
    Critical,
    /// At or below the reorder point.
    Low,
    Normal,
    /// Above the full threshold.
    High,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeView {
    pub percent: Percent,
    pub band: Band,
    /// `percent / 100`, in `[0, 1]`.
    pub fill_ratio: f64,
}

impl GaugeView {
    pub fn new(percent: Percent, thresholds: &Thresholds) -> Self {
        let level = percent.value();
        let band = if level < thresholds.empty {
            Band::Critical
        } else if level <= thresholds.reorder {
            Band::Low
        } else if level > thresholds.full {
            Band::High
        } else {
            Band::Normal
        };

        Self {
            percent,
            band,
            fill_ratio: level / 100.0,
        }
    }

    /// Number of filled cells in a bar `width` cells wide.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::as_conversions
    )]
    pub fn filled_cells(&self, width: usize) -> usize {
        let filled = (self.fill_ratio * width as f64).round() as usize;
        filled.min(width)
    }
}
