// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ReasonLoopError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ReasonLoopError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.run,
            raw.provider,
            raw.abilities,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_run_section(cfg)?;
    validate_provider_section(cfg)?;
    Ok(())
}

fn validate_run_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.max_concurrent == 0 {
        return Err(ReasonLoopError::ConfigError(
            "[run].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.run.context_preview_chars == 0 {
        return Err(ReasonLoopError::ConfigError(
            "[run].context_preview_chars must be >= 1 (got 0)".to_string(),
        ));
    }

    // An unbounded retry count turns a permanently failing ability into a
    // very slow run; cap it at something clearly intentional.
    if cfg.run.max_retries > 10 {
        return Err(ReasonLoopError::ConfigError(format!(
            "[run].max_retries must be <= 10 (got {})",
            cfg.run.max_retries
        )));
    }

    Ok(())
}

fn validate_provider_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.provider.api_url.trim().is_empty() {
        return Err(ReasonLoopError::ConfigError(
            "[provider].api_url must not be empty".to_string(),
        ));
    }

    if cfg.provider.model.trim().is_empty() {
        return Err(ReasonLoopError::ConfigError(
            "[provider].model must not be empty".to_string(),
        ));
    }

    Ok(())
}
