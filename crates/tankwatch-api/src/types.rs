// Wire types for the level service and the order API.
//
// Field names follow the server's snake_case JSON; no renames needed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ── Percent ──────────────────────────────────────────────────────────

/// A tank level as a percentage in `[0, 100]`.
///
/// Constructed only through [`Percent::new`], so every value inside the
/// pipeline is finite and bounded.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Percent(f64);

impl Percent {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(100.0);

    /// Validate a raw level. Non-finite values are rejected; finite values
    /// outside `[0, 100]` are clamped (sensors overshoot near the rails).
    pub fn new(raw: f64) -> Result<Self, Error> {
        if !raw.is_finite() {
            return Err(Error::InvalidLevel {
                raw: raw.to_string(),
            });
        }
        if !(0.0..=100.0).contains(&raw) {
            tracing::warn!(raw, "level outside 0..=100, clamping");
        }
        Ok(Self(raw.clamp(0.0, 100.0)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}%", self.0)
        } else {
            write!(f, "{:.1}%", self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

// ── Level payloads ───────────────────────────────────────────────────

/// Body of `GET /get_level` and of every `update_level` push event.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelPayload {
    /// Absent or `null` on a freshly started level service.
    #[serde(default)]
    pub level: Option<f64>,
}

// ── Orders ───────────────────────────────────────────────────────────

/// Body of `POST /orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub name: String,
    pub oil_type: String,
    pub station: u64,
    pub email: String,
}

/// An order as returned by `GET /orders/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub oil_type: String,
    #[serde(default)]
    pub station: Option<u64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `PATCH /orders/{id}/` for the approval flow.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatusUpdate<'a> {
    pub status: &'a str,
}

/// Body of the mail-dispatch endpoints.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct EmailBody<'a> {
    pub email: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn percent_rejects_nan() {
        assert!(matches!(
            Percent::new(f64::NAN),
            Err(Error::InvalidLevel { .. })
        ));
        assert!(Percent::new(f64::INFINITY).is_err());
    }

    #[test]
    fn percent_clamps_out_of_range() {
        assert_eq!(Percent::new(104.2).unwrap(), Percent::FULL);
        assert_eq!(Percent::new(-3.0).unwrap(), Percent::ZERO);
        assert_eq!(Percent::new(42.5).unwrap().value(), 42.5);
    }

    #[test]
    fn percent_display() {
        assert_eq!(Percent::new(20.0).unwrap().to_string(), "20%");
        assert_eq!(Percent::new(19.4).unwrap().to_string(), "19.4%");
    }

    #[test]
    fn percent_deserializes_integers() {
        let p: Percent = serde_json::from_str("73").unwrap();
        assert_eq!(p.value(), 73.0);
    }

    #[test]
    fn order_request_wire_shape() {
        let req = OrderRequest {
            name: "Auto Generated Order".into(),
            oil_type: "Diesel".into(),
            station: 3,
            email: "ops@station3.example".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({
                "name": "Auto Generated Order",
                "oil_type": "Diesel",
                "station": 3,
                "email": "ops@station3.example"
            })
        );
    }

    #[test]
    fn order_tolerates_sparse_rows() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 12,
            "station": 3,
            "status": "Pending",
            "created_at": "2026-03-01T10:15:00Z"
        }))
        .unwrap();
        assert_eq!(order.id, 12);
        assert_eq!(order.station, Some(3));
        assert!(order.name.is_empty());
        assert!(order.created_at.is_some());
    }
}
