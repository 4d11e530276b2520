// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs watch` - the tier-1 watchdog loop.

use crate::context::Context;
use crate::output::emit;
use anyhow::Result;
use clap::Args;
use ovs_engine::supervise;
use std::time::Duration;

#[derive(Args)]
pub struct WatchArgs {
    /// Tick interval in milliseconds (defaults to watchIntervalMs)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Detach and run as a background daemon with a PID file
    #[arg(long)]
    pub background: bool,
}

pub async fn run(args: WatchArgs, json: bool) -> Result<()> {
    let ctx = Context::open()?;

    if args.background {
        return start_background(&ctx, json);
    }

    let interval = Duration::from_millis(args.interval.unwrap_or(ctx.config.watch_interval_ms));
    emit(
        json,
        &serde_json::json!({ "watching": true, "intervalMs": interval.as_millis() as u64 }),
        &format!("Watching fleet every {}ms (ctrl-c to stop)", interval.as_millis()),
    );
    run_loop(&ctx, interval).await;
    Ok(())
}

/// Foreground loop, interrupt-driven: on signal it stops, checkpoints the
/// PID file, and exits.
async fn run_loop(ctx: &Context, interval: Duration) {
    let watchdog = ctx.watchdog();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => watchdog.tick().await,
            _ = shutdown_signal() => break,
        }
    }

    supervise::remove_pid_file(&ctx.dir);
    ctx.sessions.close();
    tracing::info!("watchdog stopped");
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(_) => {
            // No SIGTERM handler available; ctrl-c still works
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

/// Respawn ourselves detached and record the child PID. The coordinator
/// uses the PID file for start/stop/is-running queries.
pub fn start_background(ctx: &Context, json: bool) -> Result<()> {
    if supervise::watchdog_running(&ctx.dir) {
        emit(
            json,
            &serde_json::json!({ "alreadyRunning": true }),
            "Watchdog is already running",
        );
        return Ok(());
    }

    let exe = std::env::current_exe()?;
    let log = std::fs::File::create(ctx.dir.watchdog_log_file())?;
    let child = std::process::Command::new(exe)
        .args(["watch"])
        .current_dir(ctx.dir.project_root())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::from(log))
        .spawn()?;

    supervise::write_pid_file(&ctx.dir, child.id())?;
    emit(
        json,
        &serde_json::json!({ "started": true, "pid": child.id() }),
        &format!("Watchdog started in the background (pid {})", child.id()),
    );
    Ok(())
}
