// src/dag/task.rs

//! Task metadata, per-run state, and execution results.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::Role;
use crate::types::TaskId;

/// Status of a task within the run.
///
/// Transitions are `Incomplete -> InProgress -> {Complete | Failed}`,
/// exactly once; there is no way back into `Incomplete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Incomplete,
    InProgress,
    Complete,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Incomplete => write!(f, "incomplete"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Complete => write!(f, "complete"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A node in the task dependency graph.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: TaskId,

    /// Human-readable statement of work; shown to abilities and humans.
    pub description: String,

    /// Name of the ability used to execute this task.
    pub ability: String,

    /// Literal input for non-text abilities (a query, URL, or SQL string).
    /// May be empty, in which case the description is used instead.
    pub input: String,

    /// Ids of tasks whose outputs must exist before this task may run.
    pub deps: Vec<TaskId>,

    pub status: TaskStatus,

    /// Output of execution; failed tasks carry an `ERROR: <message>` marker
    /// so dependents can see why an upstream task failed.
    pub output: Option<String>,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Open extension point for extra planner-provided fields.
    pub metadata: BTreeMap<String, String>,
}

impl Task {
    pub fn new(
        id: TaskId,
        description: impl Into<String>,
        ability: impl Into<String>,
        input: impl Into<String>,
        deps: Vec<TaskId>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            ability: ability.into(),
            input: input.into(),
            deps,
            status: TaskStatus::Incomplete,
            output: None,
            created_at: Utc::now(),
            completed_at: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn mark_in_progress(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    pub fn mark_complete(&mut self, output: impl Into<String>) {
        self.status = TaskStatus::Complete;
        self.output = Some(output.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error_message: &str) {
        self.status = TaskStatus::Failed;
        self.output = Some(format!("ERROR: {error_message}"));
        self.completed_at = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Task #{}: {} [{}] [{}]",
            self.id, self.description, self.status, self.ability
        )?;
        if !self.deps.is_empty() {
            write!(f, " (depends on: {:?})", self.deps)?;
        }
        Ok(())
    }
}

/// Outcome of one execution attempt.
///
/// A retried task produces one `TaskResult` per attempt; the last one is
/// authoritative and is what the scheduler records.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub content: String,
    pub success: bool,
    pub error: Option<String>,
    #[serde(with = "duration_secs")]
    pub execution_time: Duration,
    pub timestamp: DateTime<Utc>,
}

impl TaskResult {
    pub fn success(task_id: TaskId, content: impl Into<String>, execution_time: Duration) -> Self {
        Self {
            task_id,
            content: content.into(),
            success: true,
            error: None,
            execution_time,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(task_id: TaskId, error: impl Into<String>, execution_time: Duration) -> Self {
        Self {
            task_id,
            content: String::new(),
            success: false,
            error: Some(error.into()),
            execution_time,
            timestamp: Utc::now(),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(d.as_secs_f64())
    }
}

/// Description of a task the scheduler wants the executor to run now.
///
/// Carries everything the executor needs, so execution never reads back into
/// scheduler state: the payload is the exact ability input (for
/// text-generation, the full prompt with objective and dependency context
/// already baked in).
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub description: String,
    pub ability: String,
    pub payload: String,
    pub role: Option<Role>,
}
