// src/exec/task_runner.rs

//! Individual task execution: attempts, timeout, and the completion event.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::abilities::AbilityRegistry;
use crate::dag::{ScheduledTask, TaskResult};
use crate::engine::RuntimeEvent;
use crate::exec::ExecutionPolicy;

/// Run a single task to its final result and report it to the runtime.
///
/// The result sent back is always the **last** attempt's; earlier failed
/// attempts are logged but not reported.
pub async fn run_task(
    task: ScheduledTask,
    registry: Arc<AbilityRegistry>,
    policy: ExecutionPolicy,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let task_id = task.id;
    let result = run_attempts(&task, &registry, &policy).await;

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted { result })
        .await
        .is_err()
    {
        error!(task = task_id, "runtime gone; dropping completion event");
    }
}

/// Attempt the task up to `max_retries + 1` times, returning the last
/// attempt's result.
async fn run_attempts(
    task: &ScheduledTask,
    registry: &AbilityRegistry,
    policy: &ExecutionPolicy,
) -> TaskResult {
    let attempts = policy.max_retries + 1;
    let mut last: Option<TaskResult> = None;

    for attempt in 1..=attempts {
        info!(
            task = task.id,
            ability = %task.ability,
            attempt,
            attempts,
            "executing task"
        );

        let started = Instant::now();
        let outcome = timeout(
            policy.task_timeout,
            registry.execute(&task.ability, &task.payload, task.role, Some(task.id)),
        )
        .await;

        let result = match outcome {
            Ok(Ok(output)) => TaskResult::success(task.id, output, started.elapsed()),
            Ok(Err(err)) => TaskResult::failure(task.id, err.to_string(), started.elapsed()),
            Err(_) => TaskResult::failure(
                task.id,
                format!("timed out after {}s", policy.task_timeout.as_secs()),
                started.elapsed(),
            ),
        };

        if result.success {
            info!(
                task = task.id,
                attempt,
                elapsed_ms = result.execution_time.as_millis() as u64,
                "task attempt succeeded"
            );
            return result;
        }

        warn!(
            task = task.id,
            attempt,
            attempts,
            error = result.error.as_deref().unwrap_or("unknown error"),
            "task attempt failed"
        );

        last = Some(result);

        if attempt < attempts {
            sleep(policy.retry_delay).await;
        }
    }

    // attempts >= 1, so the loop always stored a result.
    last.unwrap_or_else(|| {
        TaskResult::failure(task.id, "no attempts were made", std::time::Duration::ZERO)
    })
}
