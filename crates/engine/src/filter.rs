// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tool-argument filter.
//!
//! Hook payloads carry arbitrary tool input; a Write can hold an entire
//! file. The filter keeps a per-tool whitelist of keys, caps each value's
//! size, and produces a one-line summary, so the event store stays
//! diagnostic without drowning in blobs.

use serde_json::{Map, Value};

/// Ceiling on a single kept argument value.
const MAX_VALUE_LEN: usize = 200;

/// Keys kept per known tool, primary key first (it feeds the summary).
fn whitelist(tool: &str) -> Option<&'static [&'static str]> {
    Some(match tool {
        "Read" => &["file_path", "offset", "limit"],
        "Write" => &["file_path"],
        "Edit" => &["file_path", "replace_all"],
        "NotebookEdit" => &["notebook_path"],
        "Grep" => &["pattern", "path", "glob"],
        "Glob" => &["pattern", "path"],
        "Bash" => &["command", "description"],
        "Task" => &["description", "subagent_type"],
        "WebFetch" => &["url"],
        "WebSearch" => &["query"],
        _ => return None,
    })
}

/// Map raw tool input to (filtered args, one-line summary).
///
/// Unknown tools keep nothing; their summary is the tool name itself.
pub fn filter_tool_args(tool: &str, input: &Value) -> (Map<String, Value>, String) {
    let mut kept = Map::new();

    let Some(keys) = whitelist(tool) else {
        return (kept, tool.to_string());
    };
    let Some(obj) = input.as_object() else {
        return (kept, tool.to_string());
    };

    for &key in keys {
        if let Some(value) = obj.get(key) {
            kept.insert(key.to_string(), truncate_value(value));
        }
    }

    let summary = match keys.first().and_then(|&k| kept.get(k)) {
        Some(Value::String(s)) => format!("{} {}", tool, s),
        Some(other) => format!("{} {}", tool, other),
        None => tool.to_string(),
    };

    (kept, summary)
}

/// Truncate oversized string values, marking the cut.
fn truncate_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_VALUE_LEN => {
            let cut: String = s.chars().take(MAX_VALUE_LEN).collect();
            Value::String(format!("{}…", cut))
        }
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
