// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ovs - Overstory CLI

mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use commands::{clean, coordinator, doctor, log, monitor, nudge, sling, status, watch};
use ovs_core::OverstoryError;

#[derive(Parser)]
#[command(
    name = "ovs",
    version,
    about = "Overstory - an orchestrator for hierarchical fleets of coding agents"
)]
struct Cli {
    /// Print machine-readable JSON instead of human text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn a worker agent bound to a work item
    Sling(sling::SlingArgs),
    /// Coordinator management
    Coordinator(coordinator::CoordinatorArgs),
    /// Tier-2 monitor management
    Monitor(monitor::MonitorArgs),
    /// Run the tier-1 watchdog
    Watch(watch::WatchArgs),
    /// Inject a message into a running agent's terminal
    Nudge(nudge::NudgeArgs),
    /// Show fleet status
    Status(status::StatusArgs),
    /// Hook callback entry point (invoked by the AI runner)
    Log(log::LogArgs),
    /// Purge stores and logs
    Clean(clean::CleanArgs),
    /// Health checks for the control plane and its external tools
    Doctor(doctor::DoctorArgs),
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;
    let result = match cli.command {
        Commands::Sling(args) => sling::run(args, json).await,
        Commands::Coordinator(args) => coordinator::run(args, json).await,
        Commands::Monitor(args) => monitor::run(args, json).await,
        Commands::Watch(args) => watch::run(args, json).await,
        Commands::Nudge(args) => nudge::run(args, json).await,
        Commands::Status(args) => status::run(args, json).await,
        Commands::Log(args) => log::run(args, json).await,
        Commands::Clean(args) => clean::run(args, json).await,
        Commands::Doctor(args) => doctor::run(args, json).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Map the error chain to the taxonomy's exit codes; anything that is not
/// an [`OverstoryError`] is a generic failure.
fn exit_code(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<OverstoryError>()
        .map_or(1, OverstoryError::exit_code)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("OVERSTORY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
