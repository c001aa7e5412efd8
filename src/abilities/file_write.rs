// src/abilities/file_write.rs

//! File-write ability: persist task output as a timestamped artifact.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::abilities::Ability;
use crate::errors::{ReasonLoopError, Result};
use crate::llm::Role;

pub struct FileWrite {
    output_dir: PathBuf,
}

impl FileWrite {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl Ability for FileWrite {
    fn name(&self) -> &str {
        "file-write"
    }

    async fn execute(&self, input: &str, _role: Option<Role>) -> Result<String> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ReasonLoopError::AbilityError {
                ability: "file-write".to_string(),
                message: format!(
                    "failed to create output dir {}: {e}",
                    self.output_dir.display()
                ),
            })?;

        let filename = format!("output_{}.md", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.output_dir.join(filename);

        tokio::fs::write(&path, input)
            .await
            .map_err(|e| ReasonLoopError::AbilityError {
                ability: "file-write".to_string(),
                message: format!("failed to write {}: {e}", path.display()),
            })?;

        info!(path = %path.display(), bytes = input.len(), "wrote output file");

        Ok(format!("Wrote {} bytes to {}", input.len(), path.display()))
    }
}
