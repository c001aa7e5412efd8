// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] holds the serde model for `Reasonloop.toml`.
//! - [`loader`] reads the file (or falls back to defaults).
//! - [`validate`] turns the raw model into a checked [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate};
pub use model::{
    AbilitySection, ConfigFile, ProviderSection, RawConfigFile, RoleModels, RunSection,
};
