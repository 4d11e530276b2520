// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output helpers: every command prints a human line by default and a JSON
//! object under `--json`.

use serde_json::Value;

/// Print a success payload in the chosen format.
pub fn emit(json: bool, value: &Value, human: &str) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("{}", human);
    }
}

/// Right-pad to a column width for the simple status tables.
pub fn pad(s: &str, width: usize) -> String {
    if s.len() >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - s.len()))
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
