//! Loads [`BreakerConfig`](crate::breaker::BreakerConfig) from the same
//! JSON-file-plus-environment-variable convention the gateway lineage uses
//! for its own settings, scoped to exactly the fields this middleware needs.

use crate::breaker::BreakerConfig;
use crate::error::BreakerError;
use log::{debug, warn};
use std::path::Path;

const CONFIG_PATH_ENV_VAR: &str = "KAIROS_BREAKER_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "./breaker.json";

/// Loads a [`BreakerConfig`] from the path named by `KAIROS_BREAKER_CONFIG_PATH`
/// (default `./breaker.json`). A missing file is not an error: it falls back
/// to [`BreakerConfig::default`]. A present-but-invalid file is: malformed
/// JSON or a value that fails [`BreakerConfig::validate`] surfaces a
/// [`BreakerError::Config`].
pub fn load_breaker_config() -> Result<BreakerConfig, BreakerError> {
    let config_path = std::env::var(CONFIG_PATH_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let path = Path::new(&config_path);

    if !path.exists() {
        debug!("no breaker config at '{config_path}', using defaults");
        return Ok(BreakerConfig::default());
    }

    debug!("loading breaker configuration from '{config_path}'");

    let contents = std::fs::read_to_string(path).map_err(|err| {
        warn!("cannot read breaker config '{config_path}': {err}");
        BreakerError::Config(format!("cannot read '{config_path}': {err}"))
    })?;

    let config: BreakerConfig = serde_json::from_str(&contents)
        .map_err(|err| BreakerError::Config(format!("invalid JSON in '{config_path}': {err}")))?;

    config.validate()?;

    debug!(
        "loaded breaker configuration: fallback_duration={}ms recovery_duration={}ms check_period={}ms",
        config.fallback_duration_ms, config.recovery_duration_ms, config.check_period_ms
    );

    Ok(config)
}
