// src/report/mod.rs

//! Run report artifact: a write-once markdown summary of one run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::abilities::AbilityStats;
use crate::dag::{Scheduler, TaskStatus};
use crate::errors::Result;

/// Everything the report needs, captured after the run ends. The scheduler
/// and transcript are not read back afterwards; the report is an artifact,
/// not state.
#[derive(Debug)]
pub struct RunReport {
    pub objective: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub aborted: bool,
    pub final_answer: String,
    pub tasks: Vec<TaskRow>,
    pub transcript: String,
    pub ability_stats: BTreeMap<String, AbilityStats>,
}

#[derive(Debug)]
pub struct TaskRow {
    pub id: u32,
    pub description: String,
    pub ability: String,
    pub status: TaskStatus,
    pub duration_secs: Option<f64>,
}

impl RunReport {
    /// Capture report data from a finished run.
    pub fn from_run(
        scheduler: &Scheduler,
        started_at: DateTime<Utc>,
        aborted: bool,
        final_answer: &str,
        ability_stats: BTreeMap<String, AbilityStats>,
    ) -> Self {
        let tasks = scheduler
            .tasks()
            .iter()
            .map(|t| TaskRow {
                id: t.id,
                description: t.description.clone(),
                ability: t.ability.clone(),
                status: t.status,
                duration_secs: t
                    .completed_at
                    .map(|done| (done - t.created_at).num_milliseconds() as f64 / 1000.0),
            })
            .collect();

        Self {
            objective: scheduler.objective().to_string(),
            started_at,
            finished_at: Utc::now(),
            aborted,
            final_answer: final_answer.to_string(),
            tasks,
            transcript: scheduler.session().render(),
            ability_stats,
        }
    }

    pub fn render_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str("# ReasonLoop run report\n\n");
        out.push_str(&format!("- Objective: {}\n", self.objective));
        out.push_str(&format!(
            "- Started: {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!(
            "- Finished: {}\n",
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        let wall = (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        out.push_str(&format!("- Wall time: {wall:.2}s\n"));
        if self.aborted {
            out.push_str("- **Run was aborted before completion**\n");
        }
        out.push('\n');

        out.push_str("## Tasks\n\n");
        out.push_str("| id | ability | status | duration | description |\n");
        out.push_str("|---:|---------|--------|---------:|-------------|\n");
        for row in &self.tasks {
            let duration = row
                .duration_secs
                .map(|d| format!("{d:.2}s"))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.id,
                row.ability,
                row.status,
                duration,
                row.description.replace('|', "\\|")
            ));
        }
        out.push('\n');

        if !self.ability_stats.is_empty() {
            out.push_str("## Ability usage\n\n");
            out.push_str("| ability | calls | failures | total time |\n");
            out.push_str("|---------|------:|---------:|-----------:|\n");
            for (name, stats) in &self.ability_stats {
                out.push_str(&format!(
                    "| {} | {} | {} | {:.2}s |\n",
                    name,
                    stats.calls,
                    stats.failures,
                    stats.total_time.as_secs_f64()
                ));
            }
            out.push('\n');
        }

        out.push_str("## Final answer\n\n");
        out.push_str(&self.final_answer);
        out.push_str("\n\n## Transcript\n\n");
        out.push_str(&self.transcript);
        out.push('\n');

        out
    }

    /// Write the report into `dir` with a timestamped filename and return
    /// the path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let filename = format!("run_{}.md", self.started_at.format("%Y%m%d_%H%M%S"));
        let path = dir.join(filename);

        fs::write(&path, self.render_markdown())?;
        Ok(path)
    }
}
