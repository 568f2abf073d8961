//! Shared configuration for the tankwatch CLI and TUI.
//!
//! TOML config + `TANKWATCH_*` environment layering, the station session
//! file, and translation to `tankwatch_core::MonitorConfig` and the
//! `tankwatch_api` endpoint/transport types. Both binaries depend on this
//! crate; the CLI adds flag overrides on top.

mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use tankwatch_api::{Endpoints, ReconnectConfig, TransportConfig, client::DEFAULT_NOTIFY_PATH};
use tankwatch_core::{CoreError, MonitorConfig, OrderTemplate, SessionIdentity, Thresholds, TriggerMode};

pub use session::{clear_session, load_session, load_session_from, save_session, session_path};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "TANKWATCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{} already exists (use --force to overwrite)", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub order: OrderConfig,

    #[serde(default)]
    pub toast: ToastConfig,

    #[serde(default)]
    pub reconnect: ReconnectSection,
}

/// Where the level service and order API live.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Level service root; `get_level` and the push channel hang off it.
    #[serde(default = "default_level_url")]
    pub level_url: String,

    /// Order API root.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Push channel URL. Derived from `level_url` when unset.
    pub feed_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            level_url: default_level_url(),
            api_url: default_api_url(),
            feed_url: None,
            timeout_secs: default_timeout(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_level_url() -> String {
    "http://localhost:5000".into()
}
fn default_api_url() -> String {
    "http://localhost:8000/api/".into()
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_full")]
    pub full: f64,
    #[serde(default = "default_empty")]
    pub empty: f64,
    #[serde(default = "default_reorder")]
    pub reorder: f64,
    #[serde(default)]
    pub trigger_mode: TriggerMode,
    /// Points above `reorder` the level must climb before another order.
    #[serde(default)]
    pub rearm_hysteresis: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            full: default_full(),
            empty: default_empty(),
            reorder: default_reorder(),
            trigger_mode: TriggerMode::default(),
            rearm_hysteresis: 0.0,
        }
    }
}

fn default_full() -> f64 {
    90.0
}
fn default_empty() -> f64 {
    10.0
}
fn default_reorder() -> f64 {
    20.0
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderConfig {
    #[serde(default = "default_order_name")]
    pub name: String,
    #[serde(default = "default_oil_type")]
    pub oil_type: String,
    /// Reorder mail-dispatch path, relative to `service.api_url`.
    #[serde(default = "default_notify_path")]
    pub notify_path: String,
    #[serde(default = "default_order_timeout")]
    pub timeout_secs: u64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            name: default_order_name(),
            oil_type: default_oil_type(),
            notify_path: default_notify_path(),
            timeout_secs: default_order_timeout(),
        }
    }
}

fn default_order_name() -> String {
    OrderTemplate::default().name
}
fn default_oil_type() -> String {
    OrderTemplate::default().oil_type
}
fn default_notify_path() -> String {
    DEFAULT_NOTIFY_PATH.into()
}
fn default_order_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToastConfig {
    #[serde(default = "default_toast_ms")]
    pub duration_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_toast_ms(),
        }
    }
}

fn default_toast_ms() -> u64 {
    3000
}

/// Push-channel reconnect backoff.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReconnectSection {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Unset retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            max_retries: None,
        }
    }
}

fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30_000
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "tankwatch", "tankwatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for state that is not configuration (the session file).
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("tankwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `explicit` (or the canonical path) plus environment.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = explicit.map_or_else(config_path, Path::to_path_buf);
    load_config_from(&path)
}

/// Defaults, then the TOML file at `path` if it exists, then
/// `TANKWATCH_SECTION__KEY` environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Write a starter config with every default spelled out.
pub fn init_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    save_config(path, &Config::default())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, cfg.to_toml()?)?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse()
        .map_err(|e| invalid(field, format!("'{raw}' is not a valid URL ({e})")))
}

impl Config {
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value that would otherwise fail later at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("service.level_url", &self.service.level_url)?;
        parse_url("service.api_url", &self.service.api_url)?;
        if let Some(ref feed) = self.service.feed_url {
            parse_url("service.feed_url", feed)?;
        }
        if self.service.timeout_secs == 0 {
            return Err(invalid("service.timeout_secs", "must be at least 1"));
        }

        self.thresholds().validate().map_err(|e| match e {
            CoreError::Config { message } => invalid("thresholds", message),
            other => invalid("thresholds", other.to_string()),
        })?;
        let hysteresis = self.thresholds.rearm_hysteresis;
        if !hysteresis.is_finite() || hysteresis < 0.0 {
            return Err(invalid(
                "thresholds.rearm_hysteresis",
                format!("must be zero or positive, got {hysteresis}"),
            ));
        }

        if self.order.name.trim().is_empty() {
            return Err(invalid("order.name", "must not be empty"));
        }
        if self.order.timeout_secs == 0 {
            return Err(invalid("order.timeout_secs", "must be at least 1"));
        }
        if self.toast.duration_ms == 0 {
            return Err(invalid("toast.duration_ms", "must be at least 1"));
        }
        if self.reconnect.initial_delay_ms > self.reconnect.max_delay_ms {
            return Err(invalid(
                "reconnect.initial_delay_ms",
                "must not exceed reconnect.max_delay_ms",
            ));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            full: self.thresholds.full,
            empty: self.thresholds.empty,
            reorder: self.thresholds.reorder,
        }
    }

    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let mut endpoints = Endpoints::new(
            parse_url("service.level_url", &self.service.level_url)?,
            parse_url("service.api_url", &self.service.api_url)?,
        );
        endpoints.notify_path.clone_from(&self.order.notify_path);
        Ok(endpoints)
    }

    /// Explicit `service.feed_url`, or the Socket.IO endpoint under `level_url`.
    pub fn feed_url(&self) -> Result<Url, ConfigError> {
        if let Some(ref raw) = self.service.feed_url {
            return parse_url("service.feed_url", raw);
        }
        let level = parse_url("service.level_url", &self.service.level_url)?;
        tankwatch_api::socketio::endpoint(&level)
            .map_err(|e| invalid("service.level_url", e.to_string()))
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.service.timeout_secs),
            ca_cert: self.service.ca_cert.clone(),
            accept_invalid_certs: self.service.insecure,
        }
    }

    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.reconnect.initial_delay_ms),
            max_delay: Duration::from_millis(self.reconnect.max_delay_ms),
            max_retries: self.reconnect.max_retries,
        }
    }

    /// Build the monitor settings for one session.
    pub fn monitor_config(&self, identity: SessionIdentity) -> MonitorConfig {
        MonitorConfig {
            thresholds: self.thresholds(),
            trigger_mode: self.thresholds.trigger_mode,
            rearm_hysteresis: self.thresholds.rearm_hysteresis,
            order: OrderTemplate {
                name: self.order.name.clone(),
                oil_type: self.order.oil_type.clone(),
            },
            identity,
            order_timeout: Duration::from_secs(self.order.timeout_secs),
            toast_duration: Duration::from_millis(self.toast.duration_ms),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    fn load_in(jail: &Jail) -> Result<Config, ConfigError> {
        load_config_from(&jail.directory().join("config.toml"))
    }

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let config = load_in(jail).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.service.level_url, "http://localhost:5000");
            assert_eq!(config.service.api_url, "http://localhost:8000/api/");
            assert_eq!(config.toast.duration_ms, 3000);
            Ok(())
        });
    }

    #[test]
    fn file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [service]
                level_url = "https://levels.station3.example"

                [thresholds]
                reorder = 25
                trigger_mode = "exact"

                [order]
                oil_type = "Heating oil"
                "#,
            )?;

            let config = load_in(jail).unwrap();
            assert_eq!(config.service.level_url, "https://levels.station3.example");
            assert!((config.thresholds.reorder - 25.0).abs() < f64::EPSILON);
            assert_eq!(config.thresholds.trigger_mode, TriggerMode::Exact);
            assert_eq!(config.order.oil_type, "Heating oil");
            assert_eq!(config.order.name, "Auto Generated Order");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[thresholds]\nfull = 85\n")?;
            jail.set_env("TANKWATCH_THRESHOLDS__FULL", "95");
            jail.set_env("TANKWATCH_SERVICE__API_URL", "http://orders.test/api/");

            let config = load_in(jail).unwrap();
            assert!((config.thresholds.full - 95.0).abs() < f64::EPSILON);
            assert_eq!(config.service.api_url, "http://orders.test/api/");
            Ok(())
        });
    }

    #[test]
    fn invalid_thresholds_rejected_with_field() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[thresholds]\nempty = 40\nreorder = 20\n")?;

            let err = load_in(jail).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation { ref field, .. } if field == "thresholds"),
                "got {err:?}"
            );
            assert!(err.to_string().contains("thresholds.empty"), "{err}");
            Ok(())
        });
    }

    #[test]
    fn invalid_url_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TANKWATCH_SERVICE__LEVEL_URL", "not a url");
            let err = load_in(jail).unwrap_err();
            assert!(err.to_string().contains("service.level_url"), "{err}");
            Ok(())
        });
    }

    #[test]
    fn feed_url_derived_from_level_url() {
        let config = Config::default();
        assert_eq!(
            config.feed_url().unwrap().as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );

        let mut explicit = Config::default();
        explicit.service.feed_url = Some("wss://push.example/socket.io/?EIO=4&transport=websocket".into());
        assert_eq!(explicit.feed_url().unwrap().scheme(), "wss");
    }

    #[test]
    fn translates_to_monitor_config() {
        let mut config = Config::default();
        config.order.timeout_secs = 4;
        config.toast.duration_ms = 1500;
        config.thresholds.rearm_hysteresis = 2.5;

        let monitor = config.monitor_config(SessionIdentity::new(3, "ops@station3.example"));
        assert_eq!(monitor.order_timeout, Duration::from_secs(4));
        assert_eq!(monitor.toast_duration, Duration::from_millis(1500));
        assert!((monitor.rearm_hysteresis - 2.5).abs() < f64::EPSILON);
        assert_eq!(monitor.identity.station, Some(3));
        assert_eq!(monitor.order.oil_type, "Diesel");
    }

    #[test]
    fn endpoints_carry_notify_path() {
        let mut config = Config::default();
        config.order.notify_path = "mail/reorder/".into();
        let endpoints = config.endpoints().unwrap();
        assert_eq!(endpoints.notify_path, "mail/reorder/");
        assert_eq!(endpoints.api_url.as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init_config(&path, false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[thresholds]"));
        assert!(written.contains("level_url = \"http://localhost:5000\""));

        assert!(matches!(
            init_config(&path, false),
            Err(ConfigError::AlreadyExists { .. })
        ));
        init_config(&path, true).unwrap();
    }

    #[test]
    fn starter_config_round_trips() {
        let text = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
