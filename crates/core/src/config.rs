// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration (`config.yaml`).

use crate::OverstoryError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project configuration. Missing file yields defaults; an unparseable file
/// is a hard `Config` error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Short project name; part of every multiplexer session name
    pub project_name: String,
    /// Branch worktrees are created from
    pub canonical_branch: String,
    /// Cap on concurrently live sessions
    pub max_concurrent: u32,
    /// Minimum spacing between spawns, measured against the most recently
    /// started active session
    pub stagger_delay_ms: u64,
    /// Maximum hierarchy depth
    pub max_depth: u32,
    /// Idle time before a working session is considered stalled
    pub stale_threshold_ms: u64,
    /// Idle time before a stalled session is considered a zombie
    pub zombie_threshold_ms: u64,
    /// Watchdog tick interval
    pub watch_interval_ms: u64,
    /// Gates `monitor start`
    pub tier2_enabled: bool,
    /// Whether spawns consult the external issue tracker
    pub tracker_enabled: bool,
    /// AI runner executable
    pub runner_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: "project".to_string(),
            canonical_branch: "main".to_string(),
            max_concurrent: 8,
            stagger_delay_ms: 2000,
            max_depth: 3,
            stale_threshold_ms: 300_000,
            zombie_threshold_ms: 900_000,
            watch_interval_ms: 30_000,
            tier2_enabled: false,
            tracker_enabled: true,
            runner_command: "claude".to_string(),
        }
    }
}

impl Config {
    /// Load from `config.yaml`, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self, OverstoryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            OverstoryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| OverstoryError::Config(format!("invalid config.yaml: {}", e)))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
