// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `AbilityExecutor` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`executor_loop`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::abilities::AbilityRegistry;
use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::Result;

use super::executor_loop::spawn_executor;
use super::ExecutionPolicy;

/// Trait abstracting how scheduled tasks are executed.
///
/// Production code uses [`RealAbilityExecutor`]; tests can provide their own
/// implementation that doesn't touch the network.
pub trait AbilityExecutor: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// The implementation is free to:
    /// - invoke real abilities with retry and timeout (production)
    /// - simulate completion and emit `RuntimeEvent`s (tests)
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Internally, this just wraps the executor loop in [`spawn_executor`]. The
/// runtime calls `spawn_ready_tasks`, which forwards the tasks to the
/// background loop via an mpsc channel.
pub struct RealAbilityExecutor {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealAbilityExecutor {
    /// Create a new real executor backend, wiring it to the given runtime
    /// event sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(
        registry: Arc<AbilityRegistry>,
        policy: ExecutionPolicy,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        let tx = spawn_executor(registry, policy, runtime_tx);
        Self { tx }
    }
}

impl AbilityExecutor for RealAbilityExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
