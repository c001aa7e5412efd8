// src/llm/client.rs

//! Chat-completions HTTP client.

use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderSection;
use crate::errors::{ReasonLoopError, Result};
use crate::llm::Role;

const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that provides accurate, concise, and well-structured responses.";

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// Construction reads the API key from the environment variable named in the
/// config; the key itself is never stored in the config file.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    provider: ProviderSection,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl LlmClient {
    /// Build a client from the validated provider config.
    pub fn from_config(provider: &ProviderSection) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let api_key = std::env::var(&provider.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            warn!(
                env = %provider.api_key_env,
                "API key env var is unset or empty; requests go out unauthenticated"
            );
        } else {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| {
                    ReasonLoopError::ConfigError(format!("invalid API key format: {e}"))
                })?;
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(provider.timeout_secs))
            .build()
            .map_err(|e| {
                ReasonLoopError::ConfigError(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            provider: provider.clone(),
        })
    }

    /// One completion call. The role only influences which model is used.
    pub async fn complete(&self, prompt: &str, role: Role) -> Result<String> {
        let model = self.provider.model_for(role);

        debug!(
            model = %model,
            role = %role,
            prompt_chars = prompt.len(),
            "sending chat completion request"
        );

        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.provider.temperature,
            max_tokens: self.provider.max_tokens,
        };

        let response = self
            .http
            .post(&self.provider.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.api_error(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.api_error(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            // Prefer the structured error message when the body parses.
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(err) => err.error.message,
                Err(_) => body,
            };
            return Err(self.api_error(format!("API returned {status}: {message}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| self.api_error(format!("unexpected response shape: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(self.api_error("no response content received".to_string()));
        }

        let result = content.trim().to_string();
        debug!(response_chars = result.len(), "received chat completion");
        Ok(result)
    }

    fn api_error(&self, message: String) -> ReasonLoopError {
        ReasonLoopError::AbilityError {
            ability: "text-generation".to_string(),
            message,
        }
    }
}
