// src/engine/core.rs

//! Pure core run state machine.
//!
//! This module contains a synchronous, deterministic "core run" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated scheduler state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels and sending `ScheduledTask`s to the executor.

use crate::dag::{ScheduledTask, Scheduler};
use crate::engine::RuntimeEvent;
use crate::errors::{ReasonLoopError, Result};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Pure core state for one run.
///
/// Owns the scheduler (and through it, the session transcript). It has no
/// channels, no Tokio types, and performs no IO.
#[derive(Debug)]
pub struct CoreRun {
    scheduler: Scheduler,
}

impl CoreRun {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn into_scheduler(self) -> Scheduler {
        self.scheduler
    }

    /// Dispatch the initial ready batch.
    ///
    /// A validated acyclic plan always has at least one task without
    /// dependencies, so an empty initial batch with work remaining is a
    /// scheduler invariant violation, reported as a deadlock.
    pub fn start(&mut self) -> Result<CoreStep> {
        let ready = self.scheduler.collect_ready();

        if ready.is_empty() {
            let remaining = self.scheduler.remaining();
            if remaining > 0 {
                return Err(ReasonLoopError::Deadlock { remaining });
            }
            return Ok(CoreStep {
                commands: Vec::new(),
                keep_running: false,
            });
        }

        Ok(CoreStep {
            commands: vec![CoreCommand::DispatchTasks(ready)],
            keep_running: true,
        })
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    ///
    /// Raises a distinct deadlock error when a completion leaves no task
    /// running, nothing newly ready, and work still remaining — that can
    /// only happen if a scheduler invariant was violated, and must never be
    /// confused with an ordinary ability failure.
    pub fn step(&mut self, event: RuntimeEvent) -> Result<CoreStep> {
        match event {
            RuntimeEvent::TaskCompleted { result } => {
                let step = self.scheduler.record_completion(&result);

                if step.run_finished {
                    return Ok(CoreStep {
                        commands: Vec::new(),
                        keep_running: false,
                    });
                }

                if step.newly_scheduled.is_empty() && self.scheduler.in_progress_count() == 0 {
                    return Err(ReasonLoopError::Deadlock {
                        remaining: self.scheduler.remaining(),
                    });
                }

                let mut commands = Vec::new();
                if !step.newly_scheduled.is_empty() {
                    commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
                }

                Ok(CoreStep {
                    commands,
                    keep_running: true,
                })
            }
            RuntimeEvent::ShutdownRequested => Ok(CoreStep {
                commands: Vec::new(),
                keep_running: false,
            }),
        }
    }
}
