// src/abilities/web_scrape.rs

//! Web scraping ability: fetch a URL and extract readable text.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::abilities::Ability;
use crate::errors::{ReasonLoopError, Result};
use crate::llm::Role;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Content longer than this is truncated so downstream prompts stay bounded.
const MAX_CONTENT_CHARS: usize = 8000;

pub struct WebScrape {
    http: reqwest::Client,
    url_in_text: Regex,
    noise_block: Regex,
    title: Regex,
    tag: Regex,
    blank_runs: Regex,
}

impl WebScrape {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                ReasonLoopError::ConfigError(format!("failed to build HTTP client: {e}"))
            })?;

        let url_in_text = Regex::new(r"https?://[^\s]+").map_err(regex_err)?;
        // script/style/nav/header/footer content is markup noise, not page text.
        let noise_block = Regex::new(
            r"(?is)<(script|style|nav|header|footer)[^>]*>.*?</(script|style|nav|header|footer)>",
        )
        .map_err(regex_err)?;
        let title = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").map_err(regex_err)?;
        let tag = Regex::new(r"<[^>]+>").map_err(regex_err)?;
        let blank_runs = Regex::new(r"\n\s*\n+").map_err(regex_err)?;

        Ok(Self {
            http,
            url_in_text,
            noise_block,
            title,
            tag,
            blank_runs,
        })
    }

    fn extract_text(&self, html: &str) -> String {
        let without_noise = self.noise_block.replace_all(html, "");
        let with_breaks = self.tag.replace_all(&without_noise, "\n");

        let collapsed: String = with_breaks
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        self.blank_runs.replace_all(&collapsed, "\n").to_string()
    }
}

fn regex_err(e: regex::Error) -> ReasonLoopError {
    ReasonLoopError::ConfigError(format!("invalid scrape regex: {e}"))
}

#[async_trait]
impl Ability for WebScrape {
    fn name(&self) -> &str {
        "web-scrape"
    }

    async fn execute(&self, input: &str, _role: Option<Role>) -> Result<String> {
        // The planner sometimes embeds the URL in a sentence; pull it out.
        let input = input.trim();
        let url = if input.starts_with("http") {
            input.split_whitespace().next().unwrap_or(input).to_string()
        } else {
            match self.url_in_text.find(input) {
                Some(m) => m.as_str().to_string(),
                None => {
                    return Err(ReasonLoopError::AbilityError {
                        ability: "web-scrape".to_string(),
                        message: format!("no valid URL found in input: {input:.60}"),
                    });
                }
            }
        };

        let body = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ReasonLoopError::AbilityError {
                ability: "web-scrape".to_string(),
                message: format!("fetch of {url} failed: {e}"),
            })?
            .text()
            .await
            .map_err(|e| ReasonLoopError::AbilityError {
                ability: "web-scrape".to_string(),
                message: format!("failed to read body of {url}: {e}"),
            })?;

        let title = self
            .title
            .captures(&body)
            .map(|c| self.tag.replace_all(c[1].trim(), "").to_string())
            .unwrap_or_else(|| "No title".to_string());

        let mut content = self.extract_text(&body);
        if content.chars().count() > MAX_CONTENT_CHARS {
            content = content.chars().take(MAX_CONTENT_CHARS).collect();
            content.push_str("...\n[Truncated]");
        }

        debug!(url = %url, content_chars = content.len(), "web scrape completed");

        Ok(format!("Title: {title}\nURL: {url}\n\nContent:\n{content}"))
    }
}
