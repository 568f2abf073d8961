// Station session identity: which station this terminal reports for and
// which address receives order mail. Kept apart from config.toml because
// operators switch stations without touching the service settings.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};

use tankwatch_core::SessionIdentity;

use crate::{ConfigError, ENV_PREFIX, data_dir};

pub fn session_path() -> PathBuf {
    data_dir().join("session.toml")
}

/// Session file at the canonical path, overridden by `TANKWATCH_STATION`
/// and `TANKWATCH_EMAIL`.
pub fn load_session() -> Result<SessionIdentity, ConfigError> {
    load_session_from(&session_path())
}

pub fn load_session_from(path: &Path) -> Result<SessionIdentity, ConfigError> {
    let identity: SessionIdentity = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).only(&["station", "email"]))
        .extract()?;
    Ok(identity)
}

/// Merge `update` into the stored session and write it back.
pub fn save_session(path: &Path, update: &SessionIdentity) -> Result<SessionIdentity, ConfigError> {
    let mut stored = read_file(path)?;
    if let Some(station) = update.station {
        stored.station = Some(station);
    }
    if let Some(ref email) = update.email {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(ConfigError::Validation {
                field: "email".into(),
                reason: format!("'{email}' is not an email address"),
            });
        }
        stored.email = Some(email.trim().to_owned());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(&stored)?)?;
    Ok(stored)
}

/// Remove the session file. Returns `false` if there was none.
pub fn clear_session(path: &Path) -> Result<bool, ConfigError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// The file alone, without environment overrides.
fn read_file(path: &Path) -> Result<SessionIdentity, ConfigError> {
    Ok(Figment::new().merge(Toml::file(path)).extract()?)
}
