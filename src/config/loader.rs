// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML, applying defaults via `serde` + `Default` impls.
/// - If the file does not exist, starts from `RawConfigFile::default()` —
///   every setting has a usable default, so a config file is optional.
/// - Validates retry/concurrency bounds and provider settings.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();

    let raw_config = if path.exists() {
        load_from_path(path)?
    } else {
        debug!(path = %path.display(), "config file not found; using defaults");
        RawConfigFile::default()
    };

    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `Reasonloop.toml` in the current working
/// directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Reasonloop.toml")
}
