// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn write_transcript(dir: &std::path::Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

const ASSISTANT_LINE: &str = r#"{"type":"assistant","message":{"model":"claude-sonnet-4","usage":{"input_tokens":100,"output_tokens":50,"cache_creation_input_tokens":20,"cache_read_input_tokens":500}}}"#;

#[test]
fn parse_usage_sums_assistant_records() {
    let tmp = TempDir::new().unwrap();
    let path = write_transcript(
        tmp.path(),
        "s.jsonl",
        &[
            r#"{"type":"user","message":{"content":"hi"}}"#,
            ASSISTANT_LINE,
            ASSISTANT_LINE,
            "not json at all",
            r#"{"type":"assistant","message":{"no_usage":true}}"#,
        ],
    );

    let (totals, model) = parse_usage(&path);
    assert_eq!(totals.input_tokens, 200);
    assert_eq!(totals.output_tokens, 100);
    assert_eq!(totals.cache_creation_tokens, 40);
    assert_eq!(totals.cache_read_tokens, 1000);
    assert_eq!(model.as_deref(), Some("claude-sonnet-4"));
}

#[test]
fn parse_usage_of_missing_file_is_zero() {
    let (totals, model) = parse_usage(std::path::Path::new("/nonexistent/t.jsonl"));
    assert!(totals.is_zero());
    assert!(model.is_none());
}

#[test]
fn find_transcript_prefers_exact_session_id() {
    let tmp = TempDir::new().unwrap();
    let workspace = tmp.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();
    let base = tmp.path().join("claude");
    let project_dir = base.join("projects").join(project_dir_name(&workspace));
    std::fs::create_dir_all(&project_dir).unwrap();
    write_transcript(&project_dir, "sess-1.jsonl", &[ASSISTANT_LINE]);
    write_transcript(&project_dir, "sess-2.jsonl", &[ASSISTANT_LINE]);

    let found = find_transcript_in(&workspace, "sess-1", &base).unwrap();
    assert!(found.ends_with("sess-1.jsonl"));
}

#[test]
fn find_transcript_falls_back_to_newest() {
    let tmp = TempDir::new().unwrap();
    let workspace = tmp.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();
    let base = tmp.path().join("claude");
    let project_dir = base.join("projects").join(project_dir_name(&workspace));
    std::fs::create_dir_all(&project_dir).unwrap();
    write_transcript(&project_dir, "other.jsonl", &[ASSISTANT_LINE]);

    let found = find_transcript_in(&workspace, "missing-session", &base).unwrap();
    assert!(found.ends_with("other.jsonl"));
}

#[test]
fn find_transcript_with_no_project_dir_is_none() {
    let tmp = TempDir::new().unwrap();
    let workspace = tmp.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();
    assert!(find_transcript_in(&workspace, "s", &tmp.path().join("claude")).is_none());
}

#[test]
fn project_dir_name_flattens_separators_and_dots() {
    let tmp = TempDir::new().unwrap();
    let dotted = tmp.path().join("my.project");
    std::fs::create_dir_all(&dotted).unwrap();
    let name = project_dir_name(&dotted);
    assert!(!name.contains('/'));
    assert!(!name.contains('.'));
}

#[test]
fn cost_estimation_by_model_family() {
    let totals = ovs_core::TokenTotals {
        input_tokens: 1_000_000,
        output_tokens: 1_000_000,
        cache_read_tokens: 0,
        cache_creation_tokens: 0,
    };
    let sonnet = estimate_cost(&totals, Some("claude-sonnet-4")).unwrap();
    assert!((sonnet - 18.0).abs() < 1e-9);
    let opus = estimate_cost(&totals, Some("claude-opus-4")).unwrap();
    assert!((opus - 90.0).abs() < 1e-9);

    assert!(estimate_cost(&totals, None).is_none());
    assert!(estimate_cost(&totals, Some("mystery-model")).is_none());
}
