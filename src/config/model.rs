// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::llm::Role;
use crate::types::DependencyFailureMode;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// max_retries = 2
/// retry_delay_ms = 2000
///
/// [provider]
/// api_url = "https://api.openai.com/v1/chat/completions"
/// model = "gpt-4o-mini"
///
/// [provider.roles]
/// planner = "gpt-4o"
///
/// [abilities]
/// web_search_enabled = true
/// ```
///
/// All sections are optional and have reasonable defaults; a missing config
/// file yields `RawConfigFile::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Scheduling and retry behaviour from `[run]`.
    #[serde(default)]
    pub run: RunSection,

    /// LLM provider settings from `[provider]`.
    #[serde(default)]
    pub provider: ProviderSection,

    /// Ability-specific settings from `[abilities]`.
    #[serde(default)]
    pub abilities: AbilitySection,
}

/// Validated configuration.
///
/// Constructed via `ConfigFile::try_from(raw)`, which enforces the sanity
/// checks in `config::validate`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunSection,
    pub provider: ProviderSection,
    pub abilities: AbilitySection,
}

impl ConfigFile {
    /// Construct without validation. Only `config::validate` should call this.
    pub(crate) fn new_unchecked(
        run: RunSection,
        provider: ProviderSection,
        abilities: AbilitySection,
    ) -> Self {
        Self {
            run,
            provider,
            abilities,
        }
    }
}

/// `[run]` section: retry policy, timeouts, concurrency, failure policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Extra attempts per task after the first one fails.
    ///
    /// A task that fails every time is attempted exactly `max_retries + 1`
    /// times.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-attempt execution timeout in seconds. Exceeding it counts as an
    /// ability failure, not a process-level abort.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Maximum number of tasks executing concurrently.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Truncation bound for each dependency output injected into a
    /// text-generation prompt.
    #[serde(default = "default_context_preview_chars")]
    pub context_preview_chars: usize,

    /// `"cascade"` or `"proceed"` — what happens to tasks whose dependency
    /// failed.
    #[serde(default)]
    pub failed_dependency: DependencyFailureMode,

    /// Directory for run report artifacts.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_task_timeout_secs() -> u64 {
    180
}

fn default_max_concurrent() -> usize {
    3
}

fn default_context_preview_chars() -> usize {
    500
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            task_timeout_secs: default_task_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            context_preview_chars: default_context_preview_chars(),
            failed_dependency: DependencyFailureMode::default(),
            report_dir: default_report_dir(),
        }
    }
}

/// `[provider]` section: the chat-completions endpoint used by the
/// text-generation ability.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    /// Chat completions endpoint URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Name of the environment variable holding the API key.
    ///
    /// An empty or unset variable means requests go out without an
    /// `Authorization` header (useful for local endpoints).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Default model, used for any role without an override.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP client timeout in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional per-role model overrides from `[provider.roles]`.
    #[serde(default)]
    pub roles: RoleModels,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_api_key_env() -> String {
    "REASONLOOP_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_provider_timeout_secs() -> u64 {
    120
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_provider_timeout_secs(),
            roles: RoleModels::default(),
        }
    }
}

impl ProviderSection {
    /// Model for a given role, falling back to the default model when no
    /// override is configured (or the override is blank).
    pub fn model_for(&self, role: Role) -> &str {
        let override_model = match role {
            Role::Orchestrator => self.roles.orchestrator.as_deref(),
            Role::Planner => self.roles.planner.as_deref(),
            Role::Executor => self.roles.executor.as_deref(),
            Role::Reviewer => self.roles.reviewer.as_deref(),
        };

        match override_model {
            Some(m) if !m.trim().is_empty() => m,
            _ => &self.model,
        }
    }
}

/// `[provider.roles]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleModels {
    #[serde(default)]
    pub orchestrator: Option<String>,
    #[serde(default)]
    pub planner: Option<String>,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub reviewer: Option<String>,
}

/// `[abilities]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AbilitySection {
    /// Whether the web-search ability performs real searches.
    #[serde(default = "default_web_search_enabled")]
    pub web_search_enabled: bool,

    /// Maximum number of search results returned per query.
    #[serde(default = "default_web_search_results")]
    pub web_search_results: usize,

    /// SQLite database used by `sql-query` / `sql-schema`. When unset, the
    /// sql abilities are not registered.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory the file-write ability writes into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_web_search_enabled() -> bool {
    true
}

fn default_web_search_results() -> usize {
    5
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for AbilitySection {
    fn default() -> Self {
        Self {
            web_search_enabled: default_web_search_enabled(),
            web_search_results: default_web_search_results(),
            database_path: None,
            output_dir: default_output_dir(),
        }
    }
}
