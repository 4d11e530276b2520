// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Beacon delivery: the structured first instruction injected into a
//! freshly spawned agent's terminal.

use ovs_adapters::MuxAdapter;
use std::time::Duration;

/// Timing knobs for pane readiness and the Enter dance. Tests shrink these.
#[derive(Debug, Clone, Copy)]
pub struct BeaconTimings {
    /// Cap on waiting for the runner's TUI to render
    pub pane_wait: Duration,
    /// Poll interval while waiting
    pub poll_interval: Duration,
    /// Gap before each follow-up Enter
    pub enter_delay: Duration,
}

impl Default for BeaconTimings {
    fn default() -> Self {
        Self {
            pane_wait: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
            enter_delay: Duration::from_secs(1),
        }
    }
}

/// Poll the pane until it renders something. Returns `false` on timeout.
pub async fn wait_for_pane<M: MuxAdapter>(mux: &M, session: &str, timings: &BeaconTimings) -> bool {
    let deadline = tokio::time::Instant::now() + timings.pane_wait;
    loop {
        if let Ok(content) = mux.capture(session).await {
            if !content.trim().is_empty() {
                return true;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(timings.poll_interval).await;
    }
}

/// Send the beacon line, then two bare Enters.
///
/// The first Enter may be consumed by the runner's re-render; the second
/// lands the message. Send failures are the caller's concern.
pub async fn deliver<M: MuxAdapter>(
    mux: &M,
    session: &str,
    beacon: &str,
    timings: &BeaconTimings,
) -> Result<(), ovs_adapters::MuxError> {
    mux.send_keys(session, beacon).await?;
    tokio::time::sleep(timings.enter_delay).await;
    mux.send_enter(session).await?;
    tokio::time::sleep(timings.enter_delay).await;
    mux.send_enter(session).await?;
    Ok(())
}

/// Compose the single-line first instruction for a worker agent.
pub fn worker_beacon(name: &str, capability: &str, bead_id: &str) -> String {
    format!(
        "You are agent '{}' with capability '{}' working bead '{}'. \
         Read .overstory/OVERLAY.md in your worktree for your brief, then begin.",
        name, capability, bead_id
    )
}

/// Compose the first instruction for a persistent agent.
pub fn persistent_beacon(name: &str, capability: &str) -> String {
    format!(
        "You are the overstory {} ('{}'). \
         Read .overstory/OVERLAY.md at the project root for your standing orders.",
        capability, name
    )
}

#[cfg(test)]
#[path = "beacon_tests.rs"]
mod tests;
