// src/agent/profile.rs

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{ReasonLoopError, Result};

/// An agent profile, loaded from a TOML file.
///
/// ```toml
/// name = "researcher"
/// description = "Researches a topic and writes a structured summary"
/// abilities = ["text-generation", "web-search"]
///
/// reasoning_framework = """
/// Break the objective into research, analysis, and synthesis steps.
/// """
/// decision_criteria = "Prefer primary sources."
/// required_output = "A markdown summary with sources."
/// ```
///
/// `abilities` is the allow-list the planner validates every planned task
/// against; the free-text sections are passed verbatim into the planning
/// prompt and are purely advisory.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentProfile {
    pub name: String,

    pub description: String,

    /// Ability names this agent may use. A plan referencing anything else is
    /// rejected as a whole.
    #[serde(default)]
    pub abilities: Vec<String>,

    #[serde(default)]
    pub reasoning_framework: String,

    #[serde(default)]
    pub decision_criteria: String,

    #[serde(default)]
    pub required_output: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl AgentProfile {
    /// Load a profile from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let profile: AgentProfile = toml::from_str(&contents)?;

        if profile.abilities.is_empty() {
            return Err(ReasonLoopError::ConfigError(format!(
                "agent profile '{}' lists no abilities",
                profile.name
            )));
        }

        Ok(profile)
    }

    /// Built-in profile used when no `--agent` is given: a generic agent
    /// allowed to use every registered ability.
    pub fn default_profile(ability_names: &[&str]) -> Self {
        Self {
            name: "reasonloop".to_string(),
            description: "A general-purpose agent that decomposes an objective into tasks"
                .to_string(),
            abilities: ability_names.iter().map(|s| s.to_string()).collect(),
            reasoning_framework: String::new(),
            decision_criteria: String::new(),
            required_output: String::new(),
            tags: Vec::new(),
        }
    }

    /// Whether this profile permits the given ability.
    pub fn allows(&self, ability: &str) -> bool {
        self.abilities.iter().any(|a| a == ability)
    }

    /// Ensure every listed ability is actually registered.
    pub fn validate_against(&self, registered: &[&str]) -> Result<()> {
        for ability in &self.abilities {
            if !registered.contains(&ability.as_str()) {
                return Err(ReasonLoopError::UnknownAbility(format!(
                    "{} (listed in agent profile '{}')",
                    ability, self.name
                )));
            }
        }
        Ok(())
    }
}
