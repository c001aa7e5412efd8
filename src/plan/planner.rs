// src/plan/planner.rs

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::abilities::text_generation::TEXT_GENERATION;
use crate::abilities::AbilityRegistry;
use crate::agent::AgentProfile;
use crate::dag::Task;
use crate::errors::{ReasonLoopError, Result};
use crate::llm::Role;
use crate::plan::repair;
use crate::types::TaskId;

/// A plan larger than this clearly ignored the 3–6 task contract and is
/// rejected outright.
pub const MAX_PLAN_TASKS: usize = 8;

/// One-shot task planner.
///
/// Calls the text-generation ability once with the planning prompt, then
/// parses and validates the response into a task list. There is no fallback
/// plan: output that cannot be repaired into a valid plan aborts the run
/// before anything executes.
pub struct Planner<'a> {
    registry: &'a AbilityRegistry,
    profile: &'a AgentProfile,
}

impl<'a> Planner<'a> {
    pub fn new(registry: &'a AbilityRegistry, profile: &'a AgentProfile) -> Self {
        Self { registry, profile }
    }

    /// Produce the initial task list for an objective.
    ///
    /// The returned order is the model's order; execution order is derived
    /// from the dependency graph, not from this list.
    pub async fn plan(&self, objective: &str) -> Result<Vec<Task>> {
        info!(agent = %self.profile.name, "creating initial task list");

        let prompt = self.build_prompt(objective);
        debug!(prompt_chars = prompt.len(), "planning prompt built");

        let response = self
            .registry
            .execute(TEXT_GENERATION, &prompt, Some(Role::Planner), None)
            .await
            .map_err(|e| ReasonLoopError::PlanningError(format!("planning call failed: {e}")))?;

        let items = repair::extract_task_array(&response)?;
        let tasks = self.tasks_from_items(items)?;

        info!(count = tasks.len(), "created task list");
        Ok(tasks)
    }

    fn build_prompt(&self, objective: &str) -> String {
        let abilities = self.profile.abilities.join(", ");

        let mut prompt = format!(
            "You are {} - {}\nAbilities available: {}\n\nObjective:\n{}\n\n",
            self.profile.name, self.profile.description, abilities, objective
        );

        if !self.profile.reasoning_framework.trim().is_empty() {
            prompt.push_str(&format!(
                "Reasoning framework:\n{}\n\n",
                self.profile.reasoning_framework.trim()
            ));
        }
        if !self.profile.decision_criteria.trim().is_empty() {
            prompt.push_str(&format!(
                "Decision criteria:\n{}\n\n",
                self.profile.decision_criteria.trim()
            ));
        }
        if !self.profile.required_output.trim().is_empty() {
            prompt.push_str(&format!(
                "Required output:\n{}\n\n",
                self.profile.required_output.trim()
            ));
        }

        prompt.push_str(&format!(
            "Return a concise JSON array of 3-6 tasks with fields:\n\
             - id (int, sequential from 1)\n\
             - description (string)\n\
             - ability (one of: {abilities})\n\
             - input (string, may be empty)\n\
             - deps (array of ids, can be empty)\n\n\
             Respond with JSON only."
        ));

        prompt
    }

    /// Validate parsed items and build the task list.
    ///
    /// Ids that are missing, non-numeric, zero, or duplicated are renumbered
    /// to the next unused sequential integer. Everything else missing or
    /// disallowed fails the whole plan.
    fn tasks_from_items(&self, items: Vec<Value>) -> Result<Vec<Task>> {
        if items.is_empty() {
            return Err(ReasonLoopError::PlanningError(
                "planner returned an empty task list".to_string(),
            ));
        }
        if items.len() > MAX_PLAN_TASKS {
            return Err(ReasonLoopError::PlanningError(format!(
                "planner returned {} tasks (limit {MAX_PLAN_TASKS})",
                items.len()
            )));
        }

        let mut used: BTreeSet<TaskId> = BTreeSet::new();
        let mut tasks = Vec::with_capacity(items.len());

        for item in &items {
            let obj = item.as_object().ok_or_else(|| {
                ReasonLoopError::PlanningError("task entry is not a JSON object".to_string())
            })?;

            let ability = obj
                .get("ability")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ReasonLoopError::PlanningError("task entry missing ability".to_string())
                })?;

            if !self.profile.allows(ability) {
                return Err(ReasonLoopError::PlanningError(format!(
                    "ability not allowed for agent '{}': {ability}",
                    self.profile.name
                )));
            }

            let id = match obj.get("id").and_then(Value::as_u64) {
                Some(n) if n > 0 && n <= u64::from(TaskId::MAX) && !used.contains(&(n as TaskId)) => {
                    n as TaskId
                }
                other => {
                    let next = next_unused_id(&used);
                    warn!(
                        raw_id = ?obj.get("id"),
                        parsed = ?other,
                        renumbered = next,
                        "task id missing or malformed; renumbering"
                    );
                    next
                }
            };
            used.insert(id);

            // A lost description is repairable (the model dropped the field
            // mid-array); a lost ability is not.
            let description = match obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
            {
                Some(s) => s.to_string(),
                None => {
                    warn!(task = id, "task missing description; using placeholder");
                    format!("Task {id}")
                }
            };

            let input = match obj.get("input") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                // The contract says string, but models sometimes return a
                // structured object; keep it as its JSON text.
                Some(other) => other.to_string(),
            };

            let deps = parse_deps(obj.get("deps"), &description)?;

            let mut task = Task::new(id, description, ability, input, deps);

            // Models sometimes attach extra fields ("priority", "insight",
            // ...); keep them as open metadata instead of dropping them.
            for (key, value) in obj {
                if !matches!(
                    key.as_str(),
                    "id" | "description" | "ability" | "input" | "deps" | "status" | "output"
                ) {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    task.metadata.insert(key.clone(), text);
                }
            }

            tasks.push(task);
        }

        if !(3..=6).contains(&tasks.len()) {
            warn!(
                count = tasks.len(),
                "plan size is outside the requested 3-6 range"
            );
        }

        Ok(tasks)
    }
}

fn next_unused_id(used: &BTreeSet<TaskId>) -> TaskId {
    let mut candidate: TaskId = 1;
    while used.contains(&candidate) {
        candidate += 1;
    }
    candidate
}

fn parse_deps(value: Option<&Value>, description: &str) -> Result<Vec<TaskId>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(entries) => {
            let mut deps = Vec::with_capacity(entries.len());
            for entry in entries {
                let id = entry
                    .as_u64()
                    .filter(|&n| n > 0 && n <= u64::from(TaskId::MAX))
                    .ok_or_else(|| {
                        ReasonLoopError::PlanningError(format!(
                            "task '{description}' has an invalid dependency id: {entry}"
                        ))
                    })?;
                let id = id as TaskId;
                if !deps.contains(&id) {
                    deps.push(id);
                }
            }
            Ok(deps)
        }
        other => Err(ReasonLoopError::PlanningError(format!(
            "task '{description}' has invalid deps field: {other}"
        ))),
    }
}
