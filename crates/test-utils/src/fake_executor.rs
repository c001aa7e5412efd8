use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use reasonloop::dag::{ScheduledTask, TaskResult};
use reasonloop::engine::RuntimeEvent;
use reasonloop::errors::Result;
use reasonloop::exec::AbilityExecutor;
use reasonloop::types::TaskId;

/// Scripted outcome for one task when run through the [`FakeExecutor`].
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Success(String),
    Failure(String),
}

/// A fake executor that:
/// - records which tasks were "run" (in dispatch order)
/// - immediately reports a completion event for each scheduled task, using
///   the scripted outcome (default: success with a canned output).
///
/// Retries and timeouts are the real executor's concern; the fake completes
/// every task on its first and only attempt.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<TaskId>>>,
    outcomes: HashMap<TaskId, FakeOutcome>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<TaskId>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            outcomes: HashMap::new(),
        }
    }

    /// Script a specific outcome for a task id.
    pub fn with_outcome(mut self, id: TaskId, outcome: FakeOutcome) -> Self {
        self.outcomes.insert(id, outcome);
        self
    }

    pub fn failing(self, id: TaskId, error: &str) -> Self {
        self.with_outcome(id, FakeOutcome::Failure(error.to_string()))
    }

    fn result_for(&self, task: &ScheduledTask) -> TaskResult {
        match self.outcomes.get(&task.id) {
            Some(FakeOutcome::Success(output)) => {
                TaskResult::success(task.id, output.clone(), Duration::ZERO)
            }
            Some(FakeOutcome::Failure(error)) => {
                TaskResult::failure(task.id, error.clone(), Duration::ZERO)
            }
            None => TaskResult::success(
                task.id,
                format!("output of task #{}", task.id),
                Duration::ZERO,
            ),
        }
    }
}

impl AbilityExecutor for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let results: Vec<TaskResult> = tasks.iter().map(|t| self.result_for(t)).collect();

        Box::pin(async move {
            for result in results {
                {
                    let mut guard = executed.lock().expect("executed lock");
                    guard.push(result.task_id);
                }

                tx.send(RuntimeEvent::TaskCompleted { result })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
