// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn stagger: caps burst spawn rate without serializing.

use ovs_core::clock::ms_from_rfc3339;
use ovs_core::AgentSession;

/// Delay a spawn must wait so it lands at least `stagger_ms` after the most
/// recently started active session.
///
/// Returns 0 when staggering is disabled or no session is active. Concurrent
/// spawns race through this barrier independently and may all compute the
/// same delay; that is accepted.
pub fn calculate_stagger_delay(stagger_ms: u64, sessions: &[AgentSession], now_ms: u64) -> u64 {
    if stagger_ms == 0 {
        return 0;
    }
    let most_recent = sessions
        .iter()
        .filter(|s| s.state.is_live())
        .filter_map(|s| ms_from_rfc3339(&s.started_at))
        .max();
    match most_recent {
        Some(started) => stagger_ms.saturating_sub(now_ms.saturating_sub(started)),
        None => 0,
    }
}

#[cfg(test)]
#[path = "stagger_tests.rs"]
mod tests;
