#![allow(dead_code)]

use reasonloop::config::RunSection;
use reasonloop::dag::Task;
use reasonloop::types::{DependencyFailureMode, TaskId};

/// Builder for `Task` to simplify test setup.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: TaskId, description: &str) -> Self {
        Self {
            task: Task::new(id, description, "text-generation", "", vec![]),
        }
    }

    pub fn ability(mut self, ability: &str) -> Self {
        self.task.ability = ability.to_string();
        self
    }

    pub fn input(mut self, input: &str) -> Self {
        self.task.input = input.to_string();
        self
    }

    pub fn dep(mut self, id: TaskId) -> Self {
        self.task.deps.push(id);
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Builder for a whole task list.
pub struct PlanBuilder {
    tasks: Vec<Task>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Shorthand: a text-generation task with the given deps.
    pub fn with_simple(mut self, id: TaskId, deps: &[TaskId]) -> Self {
        self.tasks.push(
            TaskBuilder::new(id, &format!("task {id}"))
                .build_with_deps(deps),
        );
        self
    }

    pub fn build(self) -> Vec<Task> {
        self.tasks
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskBuilder {
    fn build_with_deps(mut self, deps: &[TaskId]) -> Task {
        self.task.deps.extend_from_slice(deps);
        self.task
    }
}

/// A `[run]` section with test-friendly defaults (no retries, no delays).
pub fn run_section() -> RunSection {
    RunSection {
        max_retries: 0,
        retry_delay_ms: 0,
        task_timeout_secs: 5,
        max_concurrent: 3,
        context_preview_chars: 500,
        failed_dependency: DependencyFailureMode::Cascade,
        ..RunSection::default()
    }
}

/// Same as [`run_section`], with the proceed-on-failed-dependency policy.
pub fn run_section_proceed() -> RunSection {
    RunSection {
        failed_dependency: DependencyFailureMode::Proceed,
        ..run_section()
    }
}
