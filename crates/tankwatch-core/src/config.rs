// ── Runtime configuration for a monitoring session ──
//
// Built by the CLI/TUI from `tankwatch-config` output. Core never reads
// files or environment variables itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tankwatch_api::OrderRequest;

use crate::error::CoreError;

/// Threshold levels in percent. Invariant: `0 <= empty <= reorder <= full <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub full: f64,
    pub empty: f64,
    pub reorder: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            full: 90.0,
            empty: 10.0,
            reorder: 20.0,
        }
    }
}

impl Thresholds {
    /// Check ordering and range. The error names the offending threshold.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("full", self.full),
            ("empty", self.empty),
            ("reorder", self.reorder),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(CoreError::Config {
                    message: format!("thresholds.{name} must be within 0..=100, got {value}"),
                });
            }
        }
        if self.empty > self.reorder {
            return Err(CoreError::Config {
                message: format!(
                    "thresholds.empty ({}) must not exceed thresholds.reorder ({})",
                    self.empty, self.reorder
                ),
            });
        }
        if self.reorder > self.full {
            return Err(CoreError::Config {
                message: format!(
                    "thresholds.reorder ({}) must not exceed thresholds.full ({})",
                    self.reorder, self.full
                ),
            });
        }
        Ok(())
    }
}

/// How the reorder rule matches a reading.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TriggerMode {
    /// Fires when the level moves from above the reorder point to at or below it.
    #[default]
    Crossing,
    /// Fires only when a reading equals the reorder point exactly.
    Exact,
}

/// Fixed fields of every automatic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTemplate {
    pub name: String,
    pub oil_type: String,
}

impl Default for OrderTemplate {
    fn default() -> Self {
        Self {
            name: "Auto Generated Order".into(),
            oil_type: "Diesel".into(),
        }
    }
}

/// Locally cached station identity. Either field may be absent until the
/// operator sets it; that only becomes an error when an order is due.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub station: Option<u64>,
    pub email: Option<String>,
}

impl SessionIdentity {
    pub fn new(station: u64, email: impl Into<String>) -> Self {
        Self {
            station: Some(station),
            email: Some(email.into()),
        }
    }

    /// Build the order request for this station, or name the missing field.
    pub fn order_request(&self, template: &OrderTemplate) -> Result<OrderRequest, CoreError> {
        let station = self
            .station
            .ok_or(CoreError::MissingIdentity { field: "station" })?;
        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(CoreError::MissingIdentity { field: "email" })?;

        Ok(OrderRequest {
            name: template.name.clone(),
            oil_type: template.oil_type.clone(),
            station,
            email: email.to_owned(),
        })
    }
}

/// Everything one [`Monitor`](crate::Monitor) needs besides its I/O ports.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub thresholds: Thresholds,
    pub trigger_mode: TriggerMode,
    /// Re-arm only once the level climbs this far above the reorder point.
    pub rearm_hysteresis: f64,
    pub order: OrderTemplate,
    pub identity: SessionIdentity,
    /// Bound on each API call the monitor makes (level fetch, order create
    /// and notify).
    pub order_timeout: Duration,
    pub toast_duration: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            trigger_mode: TriggerMode::default(),
            rearm_hysteresis: 0.0,
            order: OrderTemplate::default(),
            identity: SessionIdentity::default(),
            order_timeout: Duration::from_secs(10),
            toast_duration: Duration::from_millis(3000),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_thresholds_are_valid() {
        Thresholds::default().validate().unwrap();
    }

    #[test]
    fn inverted_thresholds_name_the_field() {
        let t = Thresholds {
            full: 90.0,
            empty: 30.0,
            reorder: 20.0,
        };
        let msg = t.validate().unwrap_err().to_string();
        assert!(msg.contains("thresholds.empty"), "{msg}");
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let t = Thresholds {
            full: 120.0,
            ..Thresholds::default()
        };
        let msg = t.validate().unwrap_err().to_string();
        assert!(msg.contains("thresholds.full"), "{msg}");
    }

    #[test]
    fn trigger_mode_parses_lowercase() {
        assert_eq!("exact".parse::<TriggerMode>().unwrap(), TriggerMode::Exact);
        assert_eq!(TriggerMode::Crossing.to_string(), "crossing");
    }

    #[test]
    fn order_request_from_identity() {
        let identity = SessionIdentity::new(3, "ops@station3.example");
        let request = identity.order_request(&OrderTemplate::default()).unwrap();
        assert_eq!(
            request,
            OrderRequest {
                name: "Auto Generated Order".into(),
                oil_type: "Diesel".into(),
                station: 3,
                email: "ops@station3.example".into(),
            }
        );
    }

    #[test]
    fn missing_station_reported() {
        let identity = SessionIdentity {
            station: None,
            email: Some("ops@station3.example".into()),
        };
        let err = identity
            .order_request(&OrderTemplate::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingIdentity { field: "station" }));
    }

    #[test]
    fn blank_email_counts_as_missing() {
        let identity = SessionIdentity {
            station: Some(3),
            email: Some("   ".into()),
        };
        let err = identity
            .order_request(&OrderTemplate::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingIdentity { field: "email" }));
    }
}
