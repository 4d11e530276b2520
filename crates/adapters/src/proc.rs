// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-tree termination.
//!
//! Killing only a pane's root process re-parents its children to PID 1 and
//! leaves the AI runner (and its own subprocesses) running headless. The
//! tree walk signals descendants deepest-first so children are gone before
//! their parents.

use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::time::Duration;
use tokio::process::Command;

/// Grace period between SIGTERM and SIGKILL.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone, Default)]
pub struct ProcessTree;

impl ProcessTree {
    pub fn new() -> Self {
        Self
    }

    /// Liveness probe: signal 0.
    pub fn is_alive(&self, pid: u32) -> bool {
        let Ok(pid) = i32::try_from(pid) else {
            return false;
        };
        kill(Pid::from_raw(pid), None).is_ok()
    }

    /// Direct children of `pid` via `pgrep -P`. An empty result is "no
    /// information needed": the process simply has no children.
    pub async fn children(&self, pid: u32) -> Vec<u32> {
        let mut cmd = Command::new("pgrep");
        cmd.args(["-P", &pid.to_string()]);
        match run_with_timeout(cmd, TMUX_TIMEOUT, "pgrep").await {
            Ok(output) => String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter_map(|line| line.trim().parse().ok())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// All descendants of `pid`, depth-first: deepest entries first.
    pub async fn descendants(&self, pid: u32) -> Vec<u32> {
        let mut ordered = Vec::new();
        let mut stack = vec![pid];
        // Iterative DFS; children are collected before their parent is pushed
        // to the output so reversal yields deepest-first order.
        let mut visit_order = Vec::new();
        while let Some(current) = stack.pop() {
            for child in self.children(current).await {
                visit_order.push(child);
                stack.push(child);
            }
        }
        // visit_order is shallowest-first; deepest-first is its reverse
        ordered.extend(visit_order.into_iter().rev());
        ordered
    }

    /// Terminate `pid` and every descendant.
    ///
    /// SIGTERM deepest-first then the root, wait `grace`, SIGKILL any
    /// survivor. Already-dead and permission-denied are success.
    pub async fn kill_tree(&self, pid: u32, grace: Duration) {
        let descendants = self.descendants(pid).await;

        for &p in &descendants {
            send_signal(p, Signal::SIGTERM);
        }
        send_signal(pid, Signal::SIGTERM);

        tokio::time::sleep(grace).await;

        for &p in descendants.iter().chain(std::iter::once(&pid)) {
            if self.is_alive(p) {
                send_signal(p, Signal::SIGKILL);
            }
        }
    }
}

/// Signal delivery that ignores already-dead (ESRCH) and permission-denied
/// (EPERM) outcomes.
fn send_signal(pid: u32, signal: Signal) {
    let Ok(pid) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid), signal) {
        match e {
            nix::errno::Errno::ESRCH | nix::errno::Errno::EPERM => {}
            other => tracing::debug!(pid, signal = %signal, errno = %other, "signal failed"),
        }
    }
}

#[cfg(test)]
#[path = "proc_tests.rs"]
mod tests;
