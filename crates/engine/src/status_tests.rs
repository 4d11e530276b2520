// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ovs_core::test_support::{message, session};
use ovs_core::SessionState;
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    sessions: SessionStore,
    metrics: MetricsStore,
    mail: MailStore,
}

fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let dir = ovs_core::ControlDir::new(tmp.path());
    dir.ensure_layout().unwrap();
    let (sessions, _) =
        SessionStore::open(&dir.sessions_db(), &dir.legacy_sessions_json()).unwrap();
    Fixture {
        sessions,
        metrics: MetricsStore::open(&dir.metrics_db()).unwrap(),
        mail: MailStore::open(&dir.mail_db()).unwrap(),
        _tmp: tmp,
    }
}

#[test]
fn default_query_shows_only_live_sessions() {
    let f = fixture();
    f.sessions.upsert(&session("live")).unwrap();
    let mut done = session("done");
    done.state = SessionState::Completed;
    f.sessions.upsert(&done).unwrap();

    let snapshot =
        StatusSnapshot::collect(&f.sessions, &f.metrics, &f.mail, &StatusQuery::default())
            .unwrap();

    assert_eq!(snapshot.sessions.len(), 1);
    assert_eq!(snapshot.sessions[0].agent_name, "live");
}

#[test]
fn all_flag_includes_terminal_sessions() {
    let f = fixture();
    f.sessions.upsert(&session("live")).unwrap();
    let mut done = session("done");
    done.state = SessionState::Completed;
    f.sessions.upsert(&done).unwrap();

    let query = StatusQuery {
        all: true,
        ..StatusQuery::default()
    };
    let snapshot = StatusSnapshot::collect(&f.sessions, &f.metrics, &f.mail, &query).unwrap();
    assert_eq!(snapshot.sessions.len(), 2);
}

#[test]
fn agent_filter_narrows_to_one() {
    let f = fixture();
    f.sessions.upsert(&session("a")).unwrap();
    f.sessions.upsert(&session("b")).unwrap();

    let query = StatusQuery {
        agent: Some("a".to_string()),
        ..StatusQuery::default()
    };
    let snapshot = StatusSnapshot::collect(&f.sessions, &f.metrics, &f.mail, &query).unwrap();
    assert_eq!(snapshot.sessions.len(), 1);
}

#[test]
fn unread_mail_counts_per_live_agent() {
    let f = fixture();
    f.sessions.upsert(&session("a")).unwrap();
    f.mail.insert(&message("x", "a", "one")).unwrap();
    let mut second = message("y", "a", "two");
    second.id = "other-id".to_string();
    f.mail.insert(&second).unwrap();

    let snapshot =
        StatusSnapshot::collect(&f.sessions, &f.metrics, &f.mail, &StatusQuery::default())
            .unwrap();

    assert_eq!(snapshot.unread_mail, vec![("a".to_string(), 2)]);
}

#[test]
fn snapshot_serializes_to_camel_case_json() {
    let f = fixture();
    f.sessions.upsert(&session("a")).unwrap();

    let snapshot =
        StatusSnapshot::collect(&f.sessions, &f.metrics, &f.mail, &StatusQuery::default())
            .unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();

    assert!(json.get("latestUsage").is_some());
    assert_eq!(json["sessions"][0]["agentName"], "a");
}
