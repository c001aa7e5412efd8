// src/abilities/hooks.rs

//! Hook interface run around every ability invocation.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::types::TaskId;

/// Observer for ability invocations.
///
/// Hooks must not fail and must not block for long; they run inline on the
/// task's execution path.
pub trait AbilityHook: Send + Sync {
    fn on_start(&self, _ability: &str, _task_id: Option<TaskId>) {}

    fn on_finish(&self, ability: &str, task_id: Option<TaskId>, elapsed: Duration, success: bool);
}

/// Per-ability aggregate numbers for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbilityStats {
    pub calls: u64,
    pub failures: u64,
    pub total_time: Duration,
}

/// Hook that accumulates per-ability call counts, failures, and cumulative
/// execution time for the run report.
#[derive(Debug, Default)]
pub struct MetricsHook {
    stats: Mutex<BTreeMap<String, AbilityStats>>,
}

impl MetricsHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the accumulated stats, keyed by ability name.
    pub fn snapshot(&self) -> BTreeMap<String, AbilityStats> {
        match self.stats.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AbilityHook for MetricsHook {
    fn on_finish(&self, ability: &str, _task_id: Option<TaskId>, elapsed: Duration, success: bool) {
        let mut guard = match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let entry = guard.entry(ability.to_string()).or_default();
        entry.calls += 1;
        if !success {
            entry.failures += 1;
        }
        entry.total_time += elapsed;
    }
}
