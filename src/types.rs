use std::str::FromStr;

use serde::Deserialize;

/// Task identifier, unique within a single run.
///
/// Assigned by the planner (sequential from 1) or regenerated during plan
/// parsing when the model returns malformed ids.
pub type TaskId = u32;

/// Behaviour for a task whose dependency ended in `Failed`.
///
/// - `Cascade`: the dependent is marked failed without executing, and so on
///   transitively (default behaviour). A permanently failed task can never
///   deadlock the run.
/// - `Proceed`: a failed dependency still satisfies readiness; the dependent
///   runs and sees the dependency's `ERROR: ...` output as context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyFailureMode {
    Cascade,
    Proceed,
}

impl Default for DependencyFailureMode {
    fn default() -> Self {
        DependencyFailureMode::Cascade
    }
}

impl FromStr for DependencyFailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cascade" => Ok(DependencyFailureMode::Cascade),
            "proceed" => Ok(DependencyFailureMode::Proceed),
            other => Err(format!(
                "invalid failed_dependency: {other} (expected \"cascade\" or \"proceed\")"
            )),
        }
    }
}
