// src/engine/mod.rs

//! Orchestration engine for reasonloop.
//!
//! This module drives one run of the task graph:
//! - the pure core state machine lives in [`core`] and reacts to task
//!   completion events by recording results and deciding what to dispatch
//!   next
//! - the async/IO shell is implemented in [`runtime`]: it reads events from
//!   a channel and forwards dispatch commands to an executor backend
//!
//! The core is intended to be extensively tested without any Tokio,
//! channels, or network.

use crate::dag::TaskResult;

/// Events flowing into the runtime from the executor (and signal handlers).
#[derive(Debug)]
pub enum RuntimeEvent {
    /// A task finished its final attempt with the given authoritative result.
    TaskCompleted { result: TaskResult },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreCommand, CoreRun, CoreStep};
pub use runtime::{RunOutcome, Runtime};
