// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum ReasonLoopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Planning error: {0}")]
    PlanningError(String),

    #[error("Cycle detected in task graph: {0}")]
    DependencyCycle(String),

    #[error("Task #{task} has unknown dependency #{dep}")]
    UnknownDependency { task: TaskId, dep: TaskId },

    #[error("Unknown ability: {0}")]
    UnknownAbility(String),

    #[error("Ability '{ability}' failed: {message}")]
    AbilityError { ability: String, message: String },

    #[error(
        "Scheduler deadlock: no task is ready or running but {remaining} task(s) remain incomplete"
    )]
    Deadlock { remaining: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ReasonLoopError>;
