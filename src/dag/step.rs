// src/dag/step.rs

//! Step-by-step result types for the scheduler.

use crate::dag::task::ScheduledTask;
use crate::types::TaskId;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the run and make
/// assertions about what changed.
#[derive(Debug, Clone)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that were newly marked as failed in this step (including the
    /// task that failed and any cascaded dependents).
    pub newly_failed: Vec<TaskId>,
    /// Whether this step brought every task to a terminal state.
    pub run_finished: bool,
}
