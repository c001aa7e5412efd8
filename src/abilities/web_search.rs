// src/abilities/web_search.rs

//! Web search ability using the DuckDuckGo HTML endpoint (no API key).

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::abilities::Ability;
use crate::config::AbilitySection;
use crate::errors::{ReasonLoopError, Result};
use crate::llm::Role;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct WebSearch {
    http: reqwest::Client,
    enabled: bool,
    max_results: usize,
    result_link: Regex,
    result_snippet: Regex,
    tag: Regex,
}

impl WebSearch {
    pub fn from_config(cfg: &AbilitySection) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                ReasonLoopError::ConfigError(format!("failed to build HTTP client: {e}"))
            })?;

        // The DuckDuckGo HTML page marks results with result__a / result__snippet
        // classes; parsing is line-oriented and intentionally tolerant.
        let result_link =
            Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
                .map_err(regex_err)?;
        let result_snippet =
            Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#)
                .map_err(regex_err)?;
        let tag = Regex::new(r"<[^>]+>").map_err(regex_err)?;

        Ok(Self {
            http,
            enabled: cfg.web_search_enabled,
            max_results: cfg.web_search_results,
            result_link,
            result_snippet,
            tag,
        })
    }

    fn strip_tags(&self, html: &str) -> String {
        self.tag.replace_all(html, "").trim().to_string()
    }
}

fn regex_err(e: regex::Error) -> ReasonLoopError {
    ReasonLoopError::ConfigError(format!("invalid search regex: {e}"))
}

#[async_trait]
impl Ability for WebSearch {
    fn name(&self) -> &str {
        "web-search"
    }

    async fn execute(&self, input: &str, _role: Option<Role>) -> Result<String> {
        if !self.enabled {
            return Ok("Web search is disabled in configuration.".to_string());
        }

        let query = input.trim();
        let url = format!(
            "https://duckduckgo.com/html/?q={}",
            query.replace(' ', "+")
        );

        let body = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ReasonLoopError::AbilityError {
                ability: "web-search".to_string(),
                message: format!("search request failed: {e}"),
            })?
            .text()
            .await
            .map_err(|e| ReasonLoopError::AbilityError {
                ability: "web-search".to_string(),
                message: format!("failed to read search response: {e}"),
            })?;

        let snippets: Vec<String> = self
            .result_snippet
            .captures_iter(&body)
            .map(|c| self.strip_tags(&c[1]))
            .collect();

        let mut formatted = String::new();
        let mut count = 0;

        for (i, caps) in self
            .result_link
            .captures_iter(&body)
            .enumerate()
            .take(self.max_results)
        {
            let link = &caps[1];
            let title = self.strip_tags(&caps[2]);
            let snippet = snippets.get(i).map(String::as_str).unwrap_or("");

            count += 1;
            formatted.push_str(&format!(
                "{count}. {title}\n   URL: {link}\n   {snippet}\n\n"
            ));
        }

        debug!(query = %query, results = count, "web search completed");

        if formatted.is_empty() {
            return Ok("No search results found.".to_string());
        }

        Ok(formatted)
    }
}
