// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue tracker (beads) client.
//!
//! Interface-only leaf: spawns `bd` and parses its JSON output. Overstory
//! needs just two operations — fetch a work item and claim it.

use crate::subprocess::{run_with_timeout, TRACKER_TIMEOUT};
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from tracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("bead not found: {0}")]
    NotFound(String),
    #[error("tracker failed: {0}")]
    CommandFailed(String),
}

/// A unit of work fetched from the tracker.
#[derive(Debug, Clone)]
pub struct Bead {
    pub id: String,
    pub status: String,
    pub title: String,
}

impl Bead {
    /// A bead can be handed to an agent when it is open or already being
    /// worked.
    pub fn is_workable(&self) -> bool {
        matches!(self.status.as_str(), "open" | "in_progress")
    }
}

#[async_trait]
pub trait TrackerClient: Clone + Send + Sync + 'static {
    async fn get_bead(&self, id: &str) -> Result<Bead, TrackerError>;

    /// Claim a bead for an agent. Already-claimed is not an error.
    async fn claim(&self, id: &str, agent: &str) -> Result<(), TrackerError>;
}

/// Production client shelling out to `bd`.
#[derive(Clone, Default)]
pub struct BeadTracker;

impl BeadTracker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TrackerClient for BeadTracker {
    async fn get_bead(&self, id: &str) -> Result<Bead, TrackerError> {
        let mut cmd = Command::new("bd");
        cmd.args(["show", id, "--json"]);
        let output = run_with_timeout(cmd, TRACKER_TIMEOUT, "bd show")
            .await
            .map_err(TrackerError::CommandFailed)?;

        if !output.status.success() {
            return Err(TrackerError::NotFound(id.to_string()));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| TrackerError::CommandFailed(format!("invalid bd output: {}", e)))?;

        Ok(Bead {
            id: json
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or(id)
                .to_string(),
            status: json
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            title: json
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn claim(&self, id: &str, agent: &str) -> Result<(), TrackerError> {
        let assignee = format!("--assignee={}", agent);
        let mut cmd = Command::new("bd");
        cmd.args(["update", id, "--status=in_progress", &assignee]);
        let output = run_with_timeout(cmd, TRACKER_TIMEOUT, "bd update")
            .await
            .map_err(TrackerError::CommandFailed)?;

        if !output.status.success() {
            // Already claimed elsewhere; the spawn continues regardless
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(bead = id, agent, stderr = %stderr, "bead claim refused");
        }
        Ok(())
    }
}

/// Fake tracker for testing
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeTracker {
    inner: std::sync::Arc<parking_lot::Mutex<FakeTrackerState>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeTrackerState {
    beads: std::collections::HashMap<String, Bead>,
    claims: Vec<(String, String)>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bead(&self, id: &str, status: &str) {
        self.inner.lock().beads.insert(
            id.to_string(),
            Bead {
                id: id.to_string(),
                status: status.to_string(),
                title: format!("bead {}", id),
            },
        );
    }

    pub fn claims(&self) -> Vec<(String, String)> {
        self.inner.lock().claims.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl TrackerClient for FakeTracker {
    async fn get_bead(&self, id: &str) -> Result<Bead, TrackerError> {
        self.inner
            .lock()
            .beads
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    async fn claim(&self, id: &str, agent: &str) -> Result<(), TrackerError> {
        self.inner
            .lock()
            .claims
            .push((id.to_string(), agent.to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
