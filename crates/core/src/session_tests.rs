// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    booting = { SessionState::Booting, true },
    working = { SessionState::Working, true },
    stalled = { SessionState::Stalled, true },
    completed = { SessionState::Completed, false },
    zombie = { SessionState::Zombie, false },
)]
fn live_states(state: SessionState, live: bool) {
    assert_eq!(state.is_live(), live);
    assert_eq!(state.is_terminal(), !live);
}

#[test]
fn mux_session_name_format() {
    assert_eq!(mux_session_name("P", "L1"), "overstory-P-L1");
}

#[test]
fn branch_name_format() {
    assert_eq!(branch_name("L1", "bead-42"), "overstory/L1/bead-42");
}

#[test]
fn session_round_trips_through_legacy_json_shape() {
    let json = r#"{
        "id": "abc",
        "agentName": "L1",
        "capability": "lead",
        "worktreePath": "/p/worktrees/L1",
        "branchName": "overstory/L1/bead-42",
        "beadId": "bead-42",
        "tmuxSession": "overstory-P-L1",
        "state": "working",
        "startedAt": "2026-01-01T00:00:00.000Z",
        "lastActivity": "2026-01-01T00:05:00.000Z"
    }"#;

    let s: AgentSession = serde_json::from_str(json).unwrap();
    assert_eq!(s.agent_name, "L1");
    assert_eq!(s.capability, crate::Capability::Lead);
    assert_eq!(s.state, SessionState::Working);
    // Fields absent from legacy entries default
    assert_eq!(s.pid, None);
    assert_eq!(s.run_id, None);
    assert_eq!(s.escalation_level, 0);
}
