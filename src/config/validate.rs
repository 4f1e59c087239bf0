// src/config/validate.rs

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HookrunError, Result};
use crate::hooks::{HookDefinition, HookRegistry};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = HookrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.settings, raw.hooks))
    }
}

/// Run semantic validation against a deserialized configuration.
///
/// This checks:
/// - `[settings]` values are in range
/// - every hook name maps to a safe route path
/// - no two hooks map to the same route
///
/// It does **not** check that programs or working directories exist; those
/// failures surface when a request actually spawns the command.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_settings(cfg)?;
    validate_hook_routes(cfg)?;

    if cfg.hooks.is_empty() {
        warn!("config contains no [[hooks]] entries; only the liveness route will be served");
    }
    Ok(())
}

fn validate_settings(cfg: &RawConfigFile) -> Result<()> {
    if cfg.settings.summary_length == 0 {
        return Err(HookrunError::ConfigError(
            "[settings].summary_length must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.settings.max_concurrent == Some(0) {
        return Err(HookrunError::ConfigError(
            "[settings].max_concurrent must be >= 1 when set (got 0)".to_string(),
        ));
    }

    if cfg.settings.shell.trim().is_empty() {
        return Err(HookrunError::ConfigError(
            "[settings].shell must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_hook_routes(cfg: &RawConfigFile) -> Result<()> {
    let definitions = cfg
        .hooks
        .iter()
        .map(HookDefinition::try_from)
        .collect::<Result<Vec<_>>>()?;
    HookRegistry::from_definitions(definitions)?;
    Ok(())
}
