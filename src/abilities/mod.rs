// src/abilities/mod.rs

//! Named ability capabilities and their registry.
//!
//! An ability is a named function from text input to text output that may
//! fail. The scheduler is polymorphic over abilities: it dispatches by name
//! and does not know whether an ability is an LLM call, an HTTP fetch, or a
//! local SQL query.
//!
//! Every invocation goes through [`AbilityRegistry::execute`], which runs
//! the registered [`hooks::AbilityHook`] chain around the call. Hooks are
//! composed once at registry construction; there is no runtime patching of
//! ability functions.

pub mod file_write;
pub mod hooks;
pub mod sql;
pub mod text_generation;
pub mod web_scrape;
pub mod web_search;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::{ReasonLoopError, Result};
use crate::llm::{LlmClient, Role};
use crate::types::TaskId;

pub use hooks::{AbilityHook, AbilityStats, MetricsHook};

/// A named executable capability.
#[async_trait]
pub trait Ability: Send + Sync {
    /// Stable name tasks refer to this ability by (e.g. `"web-search"`).
    fn name(&self) -> &str;

    /// Execute with a text input, producing text output or failing.
    ///
    /// `role` is a hint only the text-generation ability cares about; other
    /// abilities ignore it.
    async fn execute(&self, input: &str, role: Option<Role>) -> Result<String>;
}

/// Registry of all abilities available to a run, plus the hook chain.
pub struct AbilityRegistry {
    abilities: BTreeMap<String, Box<dyn Ability>>,
    hooks: Vec<Arc<dyn AbilityHook>>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self {
            abilities: BTreeMap::new(),
            hooks: Vec::new(),
        }
    }

    /// Register an ability under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register(&mut self, ability: Box<dyn Ability>) {
        debug!(ability = %ability.name(), "registering ability");
        self.abilities.insert(ability.name().to_string(), ability);
    }

    /// Add a hook that runs around every ability invocation.
    pub fn add_hook(&mut self, hook: Arc<dyn AbilityHook>) {
        self.hooks.push(hook);
    }

    /// Names of all registered abilities, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.abilities.keys().map(|s| s.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.abilities.contains_key(name)
    }

    /// Execute an ability by name, running the hook chain around the call.
    pub async fn execute(
        &self,
        name: &str,
        input: &str,
        role: Option<Role>,
        task_id: Option<TaskId>,
    ) -> Result<String> {
        let ability = self
            .abilities
            .get(name)
            .ok_or_else(|| ReasonLoopError::UnknownAbility(name.to_string()))?;

        debug!(ability = %name, task = ?task_id, input_chars = input.len(), "executing ability");

        for hook in &self.hooks {
            hook.on_start(name, task_id);
        }

        let started = Instant::now();
        let result = ability.execute(input, role).await;
        let elapsed = started.elapsed();

        for hook in &self.hooks {
            hook.on_finish(name, task_id, elapsed, result.is_ok());
        }

        result
    }
}

impl Default for AbilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AbilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityRegistry")
            .field("abilities", &self.names())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Build the full production registry from config.
///
/// The sql abilities are only registered when a database path is configured.
pub fn build_registry(cfg: &ConfigFile, client: Arc<LlmClient>) -> Result<AbilityRegistry> {
    let mut registry = AbilityRegistry::new();

    registry.register(Box::new(text_generation::TextGeneration::new(client)));
    registry.register(Box::new(web_search::WebSearch::from_config(&cfg.abilities)?));
    registry.register(Box::new(web_scrape::WebScrape::new()?));
    registry.register(Box::new(file_write::FileWrite::new(
        cfg.abilities.output_dir.clone(),
    )));

    if let Some(db_path) = &cfg.abilities.database_path {
        registry.register(Box::new(sql::SqlQuery::new(db_path.clone())));
        registry.register(Box::new(sql::SqlSchema::new(db_path.clone())));
    }

    Ok(registry)
}
