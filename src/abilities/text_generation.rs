// src/abilities/text_generation.rs

//! The text-generation ability: a thin adapter over the LLM client.

use std::sync::Arc;

use async_trait::async_trait;

use crate::abilities::Ability;
use crate::errors::Result;
use crate::llm::{LlmClient, Role};

pub const TEXT_GENERATION: &str = "text-generation";

pub struct TextGeneration {
    client: Arc<LlmClient>,
}

impl TextGeneration {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Ability for TextGeneration {
    fn name(&self) -> &str {
        TEXT_GENERATION
    }

    async fn execute(&self, input: &str, role: Option<Role>) -> Result<String> {
        let role = role.unwrap_or(Role::Orchestrator);
        self.client.complete(input, role).await
    }
}
