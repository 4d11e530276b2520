// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ovs_adapters::{FakeExpertise, FakeWorktree};
use ovs_core::clock::rfc3339_from_ms;
use ovs_core::test_support::{session, tool_event};
use ovs_core::{EventType, FakeClock};
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    dir: ControlDir,
    events: EventStore,
    mail: MailStore,
    worktree: FakeWorktree,
    expertise: FakeExpertise,
    clock: FakeClock,
}

fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let dir = ControlDir::new(tmp.path());
    dir.ensure_layout().unwrap();
    Fixture {
        events: EventStore::open(&dir.events_db()).unwrap(),
        mail: MailStore::open(&dir.mail_db()).unwrap(),
        worktree: FakeWorktree::new(),
        expertise: FakeExpertise::new(),
        clock: FakeClock::new(2_000_000_000_000),
        dir,
        _tmp: tmp,
    }
}

fn recorder(f: &Fixture) -> AutoRecord<FakeWorktree, FakeExpertise, FakeClock> {
    AutoRecord::new(
        f.dir.clone(),
        f.events.clone(),
        f.mail.clone(),
        f.worktree.clone(),
        f.expertise.clone(),
        f.clock.clone(),
    )
}

#[tokio::test]
async fn records_suggested_domains_for_changed_files() {
    let f = fixture();
    f.worktree.set_changed_files(&["src/db.rs", "src/wal.rs"]);
    f.expertise.set_domains(&["storage"]);

    recorder(&f).run(&session("B1")).await;

    let recorded = f.expertise.recorded();
    let domain_entry = recorded.iter().find(|(d, _)| d == "storage").unwrap();
    assert!(domain_entry.1.contains("B1"));
    assert!(domain_entry.1.contains("2 files"));
}

#[tokio::test]
async fn records_tool_and_error_insights_from_events() {
    let f = fixture();
    let t0 = f.clock.now_ms();
    for i in 0..3 {
        f.events
            .insert(&tool_event("B1", EventType::ToolStart, "Bash", &rfc3339_from_ms(t0 + i)))
            .unwrap();
    }
    let mut err = tool_event("B1", EventType::Error, "Bash", &rfc3339_from_ms(t0 + 10));
    err.level = ovs_core::EventLevel::Error;
    f.events.insert(&err).unwrap();

    recorder(&f).run(&session("B1")).await;

    let insights: Vec<String> = f
        .expertise
        .recorded()
        .into_iter()
        .filter(|(d, _)| d == "session-insight")
        .map(|(_, note)| note)
        .collect();
    assert!(insights.iter().any(|n| n.contains("Bash") && n.contains("3")));
    assert!(insights.iter().any(|n| n.contains("error")));
}

#[tokio::test]
async fn mails_summary_to_parent() {
    let f = fixture();
    f.worktree.set_changed_files(&["src/a.rs"]);

    recorder(&f).run(&session("B1")).await;

    let inbox = f.mail.get_for("L1", true).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].from, "B1");
    assert!(inbox[0].body.contains("src/a.rs"));
}

#[tokio::test]
async fn orphan_session_mails_the_orchestrator() {
    let f = fixture();
    let mut s = session("B1");
    s.parent_agent = None;

    recorder(&f).run(&s).await;

    assert_eq!(f.mail.get_for("orchestrator", true).unwrap().len(), 1);
}

#[tokio::test]
async fn empty_session_still_sends_summary() {
    let f = fixture();

    recorder(&f).run(&session("B1")).await;

    // No domains or insights, but the parent hears about completion
    assert!(f.expertise.recorded().is_empty());
    let inbox = f.mail.get_for("L1", true).unwrap();
    assert!(inbox[0].body.contains("no files changed"));
}
