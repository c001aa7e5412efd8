// src/plan/repair.rs

//! Structural repair of LLM plan output.
//!
//! Model output is not guaranteed to be well-formed JSON. The repairs here
//! are deliberately bounded: strip control characters, cut the array out of
//! surrounding prose or code fences, and drop orphaned-quote artifact lines
//! (none of which can occur in valid JSON, so applying them is always safe).
//! Anything that still fails to parse after that is a planning error — the
//! caller aborts rather than running a partial plan.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::errors::{ReasonLoopError, Result};

/// Extract a JSON array of task objects from raw model output.
pub fn extract_task_array(raw: &str) -> Result<Vec<Value>> {
    let cleaned = strip_control_chars(raw);
    let candidate = extract_array_slice(&cleaned).unwrap_or(cleaned.as_str());
    let repaired = drop_orphan_quote_lines(candidate);

    serde_json::from_str::<Vec<Value>>(&repaired).map_err(|e| {
        ReasonLoopError::PlanningError(format!(
            "could not parse task list after repair: {e}; output started with: {}",
            snippet(raw)
        ))
    })
}

/// Remove control characters that break JSON parsing, keeping the ones JSON
/// whitespace allows.
fn strip_control_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Cut out the `[ ... ]` region, dropping prose and code fences around it.
fn extract_array_slice(s: &str) -> Option<&str> {
    let start = s.find('[')?;
    let end = s.rfind(']')?;
    if end > start {
        Some(&s[start..=end])
    } else {
        None
    }
}

/// Drop lines that consist of nothing but a stray quote (an artifact seen in
/// truncated model output). A bare `"` or `",` line cannot occur in valid
/// JSON, since strings do not span lines.
fn drop_orphan_quote_lines(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"(?m)^\s*",?\s*$"#).expect("valid regex"));
    re.replace_all(s, "").into_owned()
}

fn snippet(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= 120 {
        trimmed.to_string()
    } else {
        trimmed.chars().take(120).collect::<String>() + "..."
    }
}
