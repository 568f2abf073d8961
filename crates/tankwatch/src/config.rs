//! Flag overrides on top of the shared `tankwatch-config` loader.

use tankwatch_api::FuelApiClient;
use tankwatch_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load config (file + env), then apply global flags and re-validate.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = tankwatch_config::load_config(global.config.as_deref())?;
    apply_overrides(&mut cfg, global);
    cfg.validate()?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref url) = global.level_url {
        cfg.service.level_url.clone_from(url);
    }
    if let Some(ref url) = global.api_url {
        cfg.service.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.service.timeout_secs = timeout;
    }
    if global.insecure {
        cfg.service.insecure = true;
    }
}

pub fn build_client(cfg: &Config) -> Result<FuelApiClient, CliError> {
    Ok(FuelApiClient::new(cfg.endpoints()?, &cfg.transport())?)
}
