// src/exec/executor_loop.rs

//! Background executor loop that fans scheduled tasks out to runners.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

use crate::abilities::AbilityRegistry;
use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::exec::ExecutionPolicy;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what the runtime (or
/// `RealAbilityExecutor`) uses to hand over ready tasks. Each scheduled task
/// runs in its own Tokio task, gated by a semaphore so that at most
/// `policy.max_concurrent` tasks execute at the same time.
///
/// The scheduler only dispatches a task once (a task never re-enters
/// `Incomplete`), so the loop doesn't need to track per-task instances.
pub fn spawn_executor(
    registry: Arc<AbilityRegistry>,
    policy: ExecutionPolicy,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!(max_concurrent = policy.max_concurrent, "executor loop started");

        let semaphore = Arc::new(Semaphore::new(policy.max_concurrent));

        while let Some(task) = rx.recv().await {
            let registry = Arc::clone(&registry);
            let semaphore = Arc::clone(&semaphore);
            let rt_tx = runtime_tx.clone();
            let task_id = task.id;

            tokio::spawn(async move {
                // The semaphore closes only if we close it, which we never
                // do; a failed acquire means the whole loop is shutting down.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                run_task(task, registry, policy, rt_tx).await;
                debug!(task = task_id, "task runner future finished");
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
