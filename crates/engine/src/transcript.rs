// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript discovery and token-usage parsing.
//!
//! The AI runner writes a JSONL transcript per session under its per-user
//! cache. Resolution order: explicit path from the hook payload, the cached
//! pointer file, then a search of the runner's project cache. The search is
//! runner-version-specific; treat it as a pluggable strategy.

use ovs_core::TokenTotals;
use std::path::{Path, PathBuf};

/// Locate the transcript for a session of the runner started in
/// `project_path`.
pub fn find_transcript(project_path: &Path, session_id: &str) -> Option<PathBuf> {
    let base = std::env::var("CLAUDE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".claude"));
    find_transcript_in(project_path, session_id, &base)
}

fn find_transcript_in(project_path: &Path, session_id: &str, base: &Path) -> Option<PathBuf> {
    let project_dir = base.join("projects").join(project_dir_name(project_path));
    let session_file = project_dir.join(format!("{}.jsonl", session_id));
    if session_file.exists() {
        return Some(session_file);
    }
    // Fallback: most recently modified transcript in the project cache
    std::fs::read_dir(&project_dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "jsonl"))
        .max_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()))
        .map(|e| e.path())
}

fn project_dir_name(path: &Path) -> String {
    // Canonicalize to resolve symlinks; the runner does this internally,
    // so we must match to find the correct project directory.
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    canonical.to_string_lossy().replace(['/', '.'], "-")
}

/// Sum token usage across a transcript's assistant records.
///
/// Reads `type: "assistant"` lines with `message.usage` fields; anything
/// unparseable is skipped. Returns the totals and the last model seen.
pub fn parse_usage(path: &Path) -> (TokenTotals, Option<String>) {
    let mut totals = TokenTotals::default();
    let mut model = None;

    let Ok(content) = std::fs::read_to_string(path) else {
        return (totals, model);
    };

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) else {
            continue;
        };
        if json.get("type").and_then(|v| v.as_str()) != Some("assistant") {
            continue;
        }
        let Some(message) = json.get("message") else {
            continue;
        };
        if let Some(m) = message.get("model").and_then(|v| v.as_str()) {
            model = Some(m.to_string());
        }
        if let Some(usage) = message.get("usage") {
            let field = |key: &str| usage.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
            totals.input_tokens += field("input_tokens");
            totals.output_tokens += field("output_tokens");
            totals.cache_creation_tokens += field("cache_creation_input_tokens");
            totals.cache_read_tokens += field("cache_read_input_tokens");
        }
    }

    (totals, model)
}

/// USD per million tokens: (input, output, cache read, cache creation).
fn rates(model: &str) -> Option<(f64, f64, f64, f64)> {
    if model.contains("opus") {
        Some((15.0, 75.0, 1.5, 18.75))
    } else if model.contains("sonnet") {
        Some((3.0, 15.0, 0.3, 3.75))
    } else if model.contains("haiku") {
        Some((0.8, 4.0, 0.08, 1.0))
    } else {
        None
    }
}

/// Estimate session cost from totals and the model name.
pub fn estimate_cost(totals: &TokenTotals, model: Option<&str>) -> Option<f64> {
    let (input, output, cache_read, cache_creation) = rates(model?)?;
    let per_m = |tokens: u64, rate: f64| tokens as f64 * rate / 1_000_000.0;
    Some(
        per_m(totals.input_tokens, input)
            + per_m(totals.output_tokens, output)
            + per_m(totals.cache_read_tokens, cache_read)
            + per_m(totals.cache_creation_tokens, cache_creation),
    )
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
