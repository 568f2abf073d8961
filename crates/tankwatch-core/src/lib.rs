// tankwatch-core: Threshold evaluation and reorder pipeline between tankwatch-api and consumers (CLI/TUI).

pub mod config;
pub mod error;
pub mod gauge;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod ports;
pub mod reorder;
pub mod threshold;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{MonitorConfig, OrderTemplate, SessionIdentity, Thresholds, TriggerMode};
pub use error::CoreError;
pub use gauge::{Band, GaugeView};
pub use model::{LevelReading, ThresholdEvent, ThresholdKind};
pub use monitor::{FeedStatus, Monitor, MonitorSnapshot};
pub use notify::{Severity, Toast, Toaster};
pub use ports::{LevelSource, OrderSink};
pub use reorder::{Decision, ReorderPhase, ReorderTrigger};
pub use threshold::{ThresholdEvaluator, classify, meets_reorder};

pub use tankwatch_api::{FeedEvent, OrderRequest, Percent};
