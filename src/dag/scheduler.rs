// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::abilities::text_generation::TEXT_GENERATION;
use crate::config::RunSection;
use crate::dag::graph::TaskGraph;
use crate::dag::step::SchedulerStep;
use crate::dag::task::{ScheduledTask, Task, TaskResult, TaskStatus};
use crate::errors::{ReasonLoopError, Result};
use crate::llm::Role;
use crate::session::SessionLog;
use crate::types::{DependencyFailureMode, TaskId};

/// Scheduler holds the immutable task graph plus mutable per-task state.
///
/// It is responsible for:
/// - deciding when a task is "ready" to run (incomplete, deps satisfied)
/// - building the ability payload for ready tasks (prompt + dependency
///   context for text-generation, literal input otherwise)
/// - recording completion results and updating task state
/// - failing dependents when a task fails (cascade policy)
/// - owning the session transcript for the run
#[derive(Debug)]
pub struct Scheduler {
    objective: String,
    /// Tasks in planner-list order. Readiness scans pick the first ready
    /// task in this order; no stronger tie-break is guaranteed.
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    graph: TaskGraph,
    session: SessionLog,
    preview_chars: usize,
    failure_mode: DependencyFailureMode,
}

impl Scheduler {
    /// Construct a scheduler from a validated plan.
    ///
    /// Fails with a planning error on an empty plan, duplicate ids, or an
    /// invalid dependency graph (self-deps, unknown ids, cycles).
    pub fn new(objective: impl Into<String>, tasks: Vec<Task>, run: &RunSection) -> Result<Self> {
        if tasks.is_empty() {
            return Err(ReasonLoopError::PlanningError(
                "plan contains no tasks".to_string(),
            ));
        }

        let mut index = HashMap::new();
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.id, i).is_some() {
                return Err(ReasonLoopError::PlanningError(format!(
                    "duplicate task id #{}",
                    task.id
                )));
            }
        }

        let graph = TaskGraph::from_tasks(&tasks)?;

        Ok(Self {
            objective: objective.into(),
            tasks,
            index,
            graph,
            session: SessionLog::new(),
            preview_chars: run.context_preview_chars,
            failure_mode: run.failed_dependency,
        })
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.index.get(&id).map(|&i| &self.tasks[i])
    }

    pub fn session(&self) -> &SessionLog {
        &self.session
    }

    /// Id of the structurally last task (a sink of the dependency graph),
    /// used to decide whether the run ends with a synthesis call.
    pub fn final_task_id(&self) -> Option<TaskId> {
        self.graph.topo_order().last().copied()
    }

    /// Whether the given dependency counts as satisfied.
    fn dep_satisfied(&self, dep: TaskId) -> bool {
        let Some(task) = self.task(dep) else {
            warn!(dep, "dependency missing from task set");
            return false;
        };

        match self.failure_mode {
            DependencyFailureMode::Cascade => task.status == TaskStatus::Complete,
            // Failed counts as terminal; the dependent will see the ERROR
            // output as context.
            DependencyFailureMode::Proceed => task.status.is_terminal(),
        }
    }

    /// Readiness check: incomplete, and every dependency satisfied.
    pub fn is_ready(&self, task: &Task) -> bool {
        task.status == TaskStatus::Incomplete
            && task.deps.iter().all(|dep| self.dep_satisfied(*dep))
    }

    /// First ready task in stored order, if any.
    pub fn find_next_ready(&self) -> Option<TaskId> {
        self.tasks.iter().find(|t| self.is_ready(t)).map(|t| t.id)
    }

    /// Collect every currently ready task, mark each `InProgress`, and
    /// return them with their ability payloads prebuilt.
    pub fn collect_ready(&mut self) -> Vec<ScheduledTask> {
        // Decide first, then mutate.
        let ready: Vec<ScheduledTask> = self
            .tasks
            .iter()
            .filter(|t| self.is_ready(t))
            .map(|t| self.build_scheduled(t))
            .collect();

        for scheduled in &ready {
            if let Some(&i) = self.index.get(&scheduled.id) {
                info!(
                    task = scheduled.id,
                    ability = %scheduled.ability,
                    "dependencies satisfied; scheduling task"
                );
                self.tasks[i].mark_in_progress();
            }
        }

        ready
    }

    /// Record the authoritative result of a task execution.
    ///
    /// Unknown ids and tasks not in progress are ignored with a warning, so
    /// a task can never take a second terminal transition.
    pub fn record_completion(&mut self, result: &TaskResult) -> SchedulerStep {
        let mut newly_failed = Vec::new();

        match self.index.get(&result.task_id).copied() {
            Some(i) => {
                if self.tasks[i].status != TaskStatus::InProgress {
                    warn!(
                        task = result.task_id,
                        status = %self.tasks[i].status,
                        "completion for task not in progress; ignoring"
                    );
                    return SchedulerStep {
                        newly_scheduled: Vec::new(),
                        newly_failed,
                        run_finished: self.all_terminal(),
                    };
                }

                if result.success {
                    self.tasks[i].mark_complete(result.content.clone());
                    debug!(task = result.task_id, "task completed successfully");
                    let task = &self.tasks[i];
                    let output = task.output.clone().unwrap_or_default();
                    let description = task.description.clone();
                    self.session
                        .append(result.task_id, &description, &output, false);
                } else {
                    let message = result.error.as_deref().unwrap_or("unknown error");
                    self.tasks[i].mark_failed(message);
                    warn!(task = result.task_id, error = %message, "task failed");
                    let task = &self.tasks[i];
                    let output = task.output.clone().unwrap_or_default();
                    let description = task.description.clone();
                    self.session
                        .append(result.task_id, &description, &output, true);

                    newly_failed.push(result.task_id);
                    if self.failure_mode == DependencyFailureMode::Cascade {
                        let mut cascaded = self.fail_dependents(result.task_id);
                        newly_failed.append(&mut cascaded);
                    }
                }
            }
            None => {
                warn!(task = result.task_id, "completion for unknown task; ignoring");
            }
        }

        let newly_scheduled = self.collect_ready();
        let run_finished = self.all_terminal();

        if run_finished {
            info!(
                completed = self.completed_count(),
                failed = self.failed_count(),
                "all tasks terminal; run finished"
            );
        }

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_finished,
        }
    }

    /// Mark all incomplete dependents (transitively) of a failed task as
    /// failed, without executing them.
    ///
    /// Returns the list of newly failed task ids (excluding the root).
    fn fail_dependents(&mut self, failed_task: TaskId) -> Vec<TaskId> {
        let mut stack: Vec<(TaskId, TaskId)> = self
            .graph
            .dependents_of(failed_task)
            .iter()
            .map(|&d| (d, failed_task))
            .collect();

        let mut newly_failed = Vec::new();

        while let Some((id, because_of)) = stack.pop() {
            let Some(&i) = self.index.get(&id) else {
                continue;
            };

            match self.tasks[i].status {
                TaskStatus::Incomplete => {
                    let message = format!("dependency task #{because_of} failed");
                    self.tasks[i].mark_failed(&message);
                    debug!(
                        task = id,
                        dependency = because_of,
                        "failing dependent due to upstream failure"
                    );

                    let output = self.tasks[i].output.clone().unwrap_or_default();
                    let description = self.tasks[i].description.clone();
                    self.session.append(id, &description, &output, true);

                    newly_failed.push(id);
                    stack.extend(self.graph.dependents_of(id).iter().map(|&d| (d, id)));
                }
                // Already terminal or currently running: a running dependent
                // would mean it was scheduled with an unsatisfied dependency,
                // which the readiness check rules out.
                TaskStatus::InProgress | TaskStatus::Complete | TaskStatus::Failed => {}
            }
        }

        newly_failed
    }

    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.is_terminal())
    }

    pub fn in_progress_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .count()
    }

    /// Number of tasks not yet in a terminal state.
    pub fn remaining(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_terminal()).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Complete)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }

    /// Build the executor-facing view of a ready task.
    fn build_scheduled(&self, task: &Task) -> ScheduledTask {
        if task.ability == TEXT_GENERATION {
            let mut prompt = format!(
                "Complete this task: {}\nObjective: {}",
                task.description, self.objective
            );

            let context = self.dependency_context(task);
            if !context.is_empty() {
                prompt.push_str("\n\nPrevious outputs:");
                prompt.push_str(&context);
            }

            ScheduledTask {
                id: task.id,
                description: task.description.clone(),
                ability: task.ability.clone(),
                payload: prompt,
                role: Some(Role::for_description(&task.description)),
            }
        } else {
            // Non-text abilities expect a literal query/URL/SQL string, not
            // a narrative prompt.
            let payload = if task.input.trim().is_empty() {
                task.description.clone()
            } else {
                task.input.clone()
            };

            ScheduledTask {
                id: task.id,
                description: task.description.clone(),
                ability: task.ability.clone(),
                payload,
                role: None,
            }
        }
    }

    /// Concatenated dependency outputs, each truncated to the preview bound.
    fn dependency_context(&self, task: &Task) -> String {
        let mut context = String::new();

        for dep in &task.deps {
            if let Some(dep_task) = self.task(*dep) {
                if let Some(output) = &dep_task.output {
                    context.push_str(&format!(
                        "\n\nOutput from task #{}:\n{}",
                        dep,
                        truncate_chars(output, self.preview_chars)
                    ));
                }
            }
        }

        context
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let mut truncated: String = s.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
