// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared start/stop/status plumbing for the persistent agents.

use crate::context::Context;
use crate::output::emit;
use anyhow::Result;
use ovs_core::{Capability, SessionState};
use std::io::IsTerminal;

/// Attach policy: an explicit flag wins; otherwise attach iff stdout is a
/// terminal.
pub fn should_attach(attach: bool, no_attach: bool) -> bool {
    if attach {
        return true;
    }
    if no_attach {
        return false;
    }
    std::io::stdout().is_terminal()
}

pub async fn start(
    ctx: &Context,
    capability: Capability,
    attach: bool,
    json: bool,
) -> Result<()> {
    register_operator_session(ctx);
    let session = ctx.lifecycle().start_persistent(capability).await?;

    emit(
        json,
        &serde_json::to_value(&session)?,
        &format!("Started {} in {}", session.agent_name, session.tmux_session),
    );

    if attach {
        attach_to(&session.tmux_session)?;
    }
    Ok(())
}

pub async fn stop(ctx: &Context, capability: Capability, json: bool) -> Result<()> {
    ctx.lifecycle().stop_persistent(capability).await?;
    emit(
        json,
        &serde_json::json!({ "stopped": capability.as_str() }),
        &format!("Stopped {}", capability),
    );
    Ok(())
}

pub fn status(ctx: &Context, capability: Capability, json: bool) -> Result<()> {
    let session = ctx.sessions.get_by_name(capability.as_str())?;
    match session {
        Some(s) if s.state.is_live() => emit(
            json,
            &serde_json::json!({
                "running": true,
                "state": s.state.as_str(),
                "tmuxSession": s.tmux_session,
                "lastActivity": s.last_activity,
            }),
            &format!("{} is {} ({})", capability, s.state, s.tmux_session),
        ),
        Some(s) if s.state == SessionState::Completed => emit(
            json,
            &serde_json::json!({ "running": false, "state": "completed" }),
            &format!("{} is not running (last session completed)", capability),
        ),
        _ => emit(
            json,
            &serde_json::json!({ "running": false }),
            &format!("{} is not running", capability),
        ),
    }
    Ok(())
}

/// If the operator launched us from inside tmux, record their session so
/// the `orchestrator` nudge sentinel can reach them. Fire-and-forget.
fn register_operator_session(ctx: &Context) {
    if std::env::var_os("TMUX").is_none() {
        return;
    }
    ovs_core::best_effort("operator-registration", || -> std::io::Result<()> {
        let output = std::process::Command::new("tmux")
            .args(["display-message", "-p", "#S"])
            .output()?;
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || name.is_empty() {
            return Ok(());
        }
        std::fs::write(
            ctx.dir.orchestrator_reg_file(),
            serde_json::json!({ "tmuxSession": name }).to_string(),
        )
    });
}

/// Hand the terminal over to tmux.
fn attach_to(session: &str) -> Result<()> {
    let status = std::process::Command::new("tmux")
        .args(["attach-session", "-t", session])
        .status()?;
    if !status.success() {
        anyhow::bail!("tmux attach-session failed for {}", session);
    }
    Ok(())
}

#[cfg(test)]
#[path = "persistent_tests.rs"]
mod tests;
