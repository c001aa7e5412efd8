// src/session/mod.rs

//! Session accounting: the append-only transcript of one run.

use chrono::{DateTime, Utc};

use crate::types::TaskId;

/// One terminal task outcome in completion order.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub task_id: TaskId,
    pub description: String,
    pub output: String,
    pub failed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Append-only log of `(task_id, description, output)` records.
///
/// Owned by the scheduler for the duration of one run: a record is appended
/// exactly once, when its task reaches a terminal state, and never mutated
/// afterwards. Consumed by final synthesis and reporting.
#[derive(Debug, Default)]
pub struct SessionLog {
    records: Vec<SessionRecord>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, task_id: TaskId, description: &str, output: &str, failed: bool) {
        self.records.push(SessionRecord {
            task_id,
            description: description.to_string(),
            output: output.to_string(),
            failed,
            completed_at: Utc::now(),
        });
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the whole transcript as one string for synthesis prompts and
    /// reports.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.records.len());

        for record in &self.records {
            let marker = if record.failed { " [failed]" } else { "" };
            parts.push(format!(
                "Task {} ({}){}:\n{}",
                record.task_id, record.description, marker, record.output
            ));
        }

        parts.join("\n\n")
    }
}
