// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::{ScheduledTask, Scheduler};
use crate::errors::Result;
use crate::exec::AbilityExecutor;

use super::core::{CoreCommand, CoreRun, CoreStep};
use super::RuntimeEvent;

/// What a finished (or aborted) run hands back for synthesis and reporting.
#[derive(Debug)]
pub struct RunOutcome {
    /// Final scheduler state, including all task outputs and the session
    /// transcript.
    pub scheduler: Scheduler,
    /// True when the run was interrupted before all tasks reached a
    /// terminal state.
    pub aborted: bool,
}

/// Drives the scheduler in response to `RuntimeEvent`s, and delegates actual
/// task execution to an `AbilityExecutor`.
///
/// This is a pure IO shell around `CoreRun`, which contains all the run
/// semantics. This struct handles async IO: reading events from channels and
/// dispatching tasks to the executor.
pub struct Runtime<E: AbilityExecutor> {
    core: CoreRun,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: AbilityExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: AbilityExecutor> Runtime<E> {
    pub fn new(core: CoreRun, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initial ready batch.
    /// - Consumes `RuntimeEvent`s from `event_rx`, feeding them into the
    ///   pure core and executing the commands it returns.
    /// - Ends when every task is terminal, on shutdown, or with a deadlock
    ///   error if the core detects an invariant violation.
    pub async fn run(mut self) -> Result<RunOutcome> {
        info!("reasonloop runtime started");

        let step = self.core.start()?;
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            match &event {
                RuntimeEvent::TaskCompleted { result } => {
                    debug!(
                        task = result.task_id,
                        success = result.success,
                        "runtime received completion event"
                    );
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested; stopping runtime");
                }
            }

            let step = self.core.step(event)?;
            keep_running = self.apply(step).await?;
        }

        let scheduler = self.core.into_scheduler();
        let aborted = !scheduler.all_terminal();

        info!(aborted, "runtime exiting");
        Ok(RunOutcome { scheduler, aborted })
    }

    /// Execute the commands of a single core step.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) => {
                    self.dispatch(tasks).await?;
                }
            }
        }
        Ok(step.keep_running)
    }

    async fn dispatch(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
        debug!(?ids, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
