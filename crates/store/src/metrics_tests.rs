// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> MetricsStore {
    MetricsStore::open(&dir.path().join("metrics.db")).unwrap()
}

fn sample_metrics(agent: &str, bead: &str) -> SessionMetrics {
    SessionMetrics {
        agent_name: agent.to_string(),
        bead_id: bead.to_string(),
        tokens: TokenTotals {
            input_tokens: 1000,
            output_tokens: 500,
            cache_read_tokens: 200,
            cache_creation_tokens: 100,
        },
        estimated_cost_usd: Some(0.42),
        model_used: Some("sonnet".to_string()),
        duration_ms: Some(60_000),
        merge_result: None,
        parent_agent: Some("L1".to_string()),
        run_id: Some("run-1".to_string()),
    }
}

fn snapshot(agent: &str, output_tokens: u64, at: &str) -> TokenSnapshot {
    TokenSnapshot {
        agent_name: agent.to_string(),
        tokens: TokenTotals {
            input_tokens: 10,
            output_tokens,
            cache_read_tokens: 0,
            cache_creation_tokens: 0,
        },
        model_used: None,
        created_at: at.to_string(),
    }
}

#[test]
fn upsert_is_keyed_on_agent_and_bead() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.upsert(&sample_metrics("B1", "bead-1")).unwrap();
    let mut updated = sample_metrics("B1", "bead-1");
    updated.tokens.output_tokens = 9000;
    store.upsert(&updated).unwrap();
    store.upsert(&sample_metrics("B1", "bead-2")).unwrap();

    let row = store.get("B1", "bead-1").unwrap().unwrap();
    assert_eq!(row.tokens.output_tokens, 9000);
    assert_eq!(row.estimated_cost_usd, Some(0.42));
    assert!(store.get("B1", "bead-2").unwrap().is_some());
    assert!(store.get("B1", "bead-3").unwrap().is_none());
}

#[test]
fn snapshots_retain_history_and_latest_wins() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store
        .record_snapshot(&snapshot("A", 100, "2026-01-01T00:00:00.000Z"))
        .unwrap();
    store
        .record_snapshot(&snapshot("A", 250, "2026-01-01T00:01:00.000Z"))
        .unwrap();
    store
        .record_snapshot(&snapshot("B", 50, "2026-01-01T00:00:30.000Z"))
        .unwrap();

    let latest = store.latest_snapshots().unwrap();
    assert_eq!(latest.len(), 2);
    let a = latest.iter().find(|s| s.agent_name == "A").unwrap();
    assert_eq!(a.tokens.output_tokens, 250);
}

#[test]
fn purge_all_clears_both_tables() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.upsert(&sample_metrics("B1", "bead-1")).unwrap();
    store
        .record_snapshot(&snapshot("B1", 1, "2026-01-01T00:00:00.000Z"))
        .unwrap();

    assert_eq!(store.purge_all().unwrap(), 2);
    assert!(store.latest_snapshots().unwrap().is_empty());
}
