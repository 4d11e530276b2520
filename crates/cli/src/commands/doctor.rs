// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs doctor` - health checks for the control plane and its tools.
//!
//! Each check is a leaf: name, category, pass/fail, one-line detail. Any
//! failure makes the command exit nonzero.

use crate::context::Context;
use anyhow::Result;
use clap::Args;
use ovs_core::{CapabilityManifest, Config};
use ovs_engine::supervise;
use serde_json::json;

#[derive(Args)]
pub struct DoctorArgs {
    /// Only run checks in this category (binaries, config, stores, supervision)
    #[arg(long)]
    pub category: Option<String>,

    /// Include passing checks in the output
    #[arg(long)]
    pub verbose: bool,
}

struct Check {
    category: &'static str,
    name: &'static str,
    ok: bool,
    detail: String,
}

pub async fn run(args: DoctorArgs, json: bool) -> Result<()> {
    let known = ["binaries", "config", "stores", "supervision"];
    if let Some(category) = &args.category {
        if !known.contains(&category.as_str()) {
            return Err(ovs_core::OverstoryError::validation(format!(
                "category: unknown '{}' (expected one of {})",
                category,
                known.join(", ")
            ))
            .into());
        }
    }

    let mut checks = Vec::new();
    collect_binary_checks(&mut checks);
    collect_config_checks(&mut checks);
    collect_store_checks(&mut checks);
    collect_supervision_checks(&mut checks);

    if let Some(category) = &args.category {
        checks.retain(|c| c.category == category.as_str());
    }

    let failures = checks.iter().filter(|c| !c.ok).count();

    if json {
        let rows: Vec<_> = checks
            .iter()
            .map(|c| {
                json!({
                    "category": c.category,
                    "name": c.name,
                    "ok": c.ok,
                    "detail": c.detail,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "checks": rows, "failures": failures }))?
        );
    } else {
        for c in &checks {
            if c.ok && !args.verbose {
                continue;
            }
            let mark = if c.ok { "ok" } else { "FAIL" };
            println!("[{}] {}/{}: {}", mark, c.category, c.name, c.detail);
        }
        if failures == 0 {
            println!("All {} checks passed.", checks.len());
        }
    }

    if failures > 0 {
        anyhow::bail!("{} doctor check(s) failed", failures);
    }
    Ok(())
}

fn binary_version(bin: &str, arg: &str) -> Option<String> {
    std::process::Command::new(bin)
        .arg(arg)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

fn collect_binary_checks(checks: &mut Vec<Check>) {
    for (bin, arg, required) in [
        ("tmux", "-V", true),
        ("git", "--version", true),
        ("bd", "--version", false),
        ("mulch", "--version", false),
    ] {
        let version = binary_version(bin, arg);
        checks.push(Check {
            category: "binaries",
            name: match bin {
                "tmux" => "tmux",
                "git" => "git",
                "bd" => "tracker",
                _ => "expertise",
            },
            ok: version.is_some() || !required,
            detail: version.unwrap_or_else(|| format!("{} not found on PATH", bin)),
        });
    }
}

fn collect_config_checks(checks: &mut Vec<Check>) {
    let Ok(ctx) = Context::open() else {
        checks.push(Check {
            category: "config",
            name: "control-dir",
            ok: false,
            detail: "cannot open the control directory".to_string(),
        });
        return;
    };

    let config = Config::load(&ctx.dir.config_yaml());
    checks.push(Check {
        category: "config",
        name: "config",
        ok: config.is_ok(),
        detail: match &config {
            Ok(c) => format!("project '{}'", c.project_name),
            Err(e) => e.to_string(),
        },
    });

    let manifest_path = ctx.dir.manifest_path();
    let manifest = if manifest_path.exists() {
        CapabilityManifest::load(&manifest_path).map(|m| !m.is_empty())
    } else {
        Ok(false)
    };
    checks.push(Check {
        category: "config",
        name: "agent-manifest",
        ok: matches!(manifest, Ok(true)),
        detail: match manifest {
            Ok(true) => "capabilities defined".to_string(),
            Ok(false) => "agent-manifest.json missing or empty".to_string(),
            Err(e) => e.to_string(),
        },
    });
}

fn collect_store_checks(checks: &mut Vec<Check>) {
    let opened = Context::open();
    checks.push(Check {
        category: "stores",
        name: "databases",
        ok: opened.is_ok(),
        detail: match &opened {
            Ok(ctx) => {
                let sessions = ctx.sessions.get_all().map(|s| s.len()).unwrap_or(0);
                if ctx.migrated {
                    format!("open (sessions: {}, migrated from sessions.json)", sessions)
                } else {
                    format!("open (sessions: {})", sessions)
                }
            }
            Err(e) => e.to_string(),
        },
    });
}

fn collect_supervision_checks(checks: &mut Vec<Check>) {
    let Ok(ctx) = Context::open() else {
        return;
    };
    let running = supervise::watchdog_running(&ctx.dir);
    checks.push(Check {
        category: "supervision",
        name: "watchdog",
        // Informational: a stopped watchdog is healthy, a stale PID is not
        ok: true,
        detail: if running {
            format!("running (pid {})", supervise::read_pid_file(&ctx.dir).unwrap_or(0))
        } else {
            "not running".to_string()
        },
    });
}
