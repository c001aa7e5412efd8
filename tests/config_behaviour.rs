// tests/config_behaviour.rs

//! Config loading/validation, agent profiles, and role selection.

use std::io::Write;

use reasonloop::agent::AgentProfile;
use reasonloop::config::{self, ConfigFile, RawConfigFile};
use reasonloop::errors::ReasonLoopError;
use reasonloop::llm::Role;
use reasonloop::types::DependencyFailureMode;

fn parse_config(toml_str: &str) -> Result<ConfigFile, ReasonLoopError> {
    let raw: RawConfigFile = toml::from_str(toml_str).expect("valid TOML");
    ConfigFile::try_from(raw)
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let cfg = config::load_and_validate("/nonexistent/Reasonloop.toml").expect("defaults");

    assert_eq!(cfg.run.max_retries, 2);
    assert_eq!(cfg.run.retry_delay_ms, 2000);
    assert_eq!(cfg.run.task_timeout_secs, 180);
    assert_eq!(cfg.run.max_concurrent, 3);
    assert_eq!(cfg.run.context_preview_chars, 500);
    assert_eq!(cfg.run.failed_dependency, DependencyFailureMode::Cascade);
}

#[test]
fn config_file_overrides_are_applied() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"
[run]
max_retries = 1
failed_dependency = "proceed"

[provider]
model = "test-model"

[provider.roles]
planner = "planner-model"
"#
    )
    .expect("write config");

    let cfg = config::load_and_validate(file.path()).expect("valid config");

    assert_eq!(cfg.run.max_retries, 1);
    assert_eq!(cfg.run.failed_dependency, DependencyFailureMode::Proceed);
    assert_eq!(cfg.provider.model_for(Role::Planner), "planner-model");
    assert_eq!(cfg.provider.model_for(Role::Executor), "test-model");
}

#[test]
fn zero_concurrency_is_rejected() {
    let result = parse_config("[run]\nmax_concurrent = 0\n");
    assert!(matches!(result, Err(ReasonLoopError::ConfigError(_))));
}

#[test]
fn excessive_retries_are_rejected() {
    let result = parse_config("[run]\nmax_retries = 99\n");
    assert!(matches!(result, Err(ReasonLoopError::ConfigError(_))));
}

#[test]
fn empty_provider_model_is_rejected() {
    let result = parse_config("[provider]\nmodel = \"\"\n");
    assert!(matches!(result, Err(ReasonLoopError::ConfigError(_))));
}

#[test]
fn blank_role_override_falls_back_to_default_model() {
    let cfg = parse_config("[provider]\nmodel = \"base\"\n\n[provider.roles]\nreviewer = \"  \"\n")
        .expect("valid config");

    assert_eq!(cfg.provider.model_for(Role::Reviewer), "base");
}

#[test]
fn role_heuristic_classifies_descriptions() {
    assert_eq!(Role::for_description("Design the database layout"), Role::Planner);
    assert_eq!(Role::for_description("Outline the article"), Role::Planner);
    assert_eq!(Role::for_description("Review the draft for errors"), Role::Reviewer);
    assert_eq!(Role::for_description("Analyze the survey results"), Role::Reviewer);
    assert_eq!(Role::for_description("Write the final summary"), Role::Executor);
    assert_eq!(Role::for_description("Generate test data"), Role::Executor);
    // Unclassified descriptions fall back to the orchestrator role.
    assert_eq!(Role::for_description("Miscellaneous follow-up"), Role::Orchestrator);
}

#[test]
fn agent_profile_loads_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"
name = "researcher"
description = "Researches a topic"
abilities = ["text-generation", "web-search"]
decision_criteria = "Prefer primary sources."
"#
    )
    .expect("write profile");

    let profile = AgentProfile::load_from_path(file.path()).expect("valid profile");

    assert_eq!(profile.name, "researcher");
    assert!(profile.allows("web-search"));
    assert!(!profile.allows("sql-query"));

    profile
        .validate_against(&["text-generation", "web-search", "web-scrape"])
        .expect("all abilities registered");

    let err = profile.validate_against(&["text-generation"]);
    assert!(matches!(err, Err(ReasonLoopError::UnknownAbility(_))));
}

#[test]
fn agent_profile_without_abilities_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"
name = "empty"
description = "No abilities"
abilities = []
"#
    )
    .expect("write profile");

    let result = AgentProfile::load_from_path(file.path());
    assert!(matches!(result, Err(ReasonLoopError::ConfigError(_))));
}
