// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain-expertise (mulch) client.
//!
//! Interface-only leaf used by the auto-record flow: suggest domains for a
//! set of changed files and record reference entries against them.

use crate::subprocess::{run_with_timeout, EXPERTISE_TIMEOUT};
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from expertise operations
#[derive(Debug, Error)]
pub enum ExpertiseError {
    #[error("expertise client failed: {0}")]
    CommandFailed(String),
}

#[async_trait]
pub trait ExpertiseClient: Clone + Send + Sync + 'static {
    /// Domains the expertise system associates with these files.
    async fn suggest_domains(&self, files: &[String]) -> Result<Vec<String>, ExpertiseError>;

    /// Record a reference entry under a domain.
    async fn record(&self, domain: &str, note: &str) -> Result<(), ExpertiseError>;
}

/// Production client shelling out to `mulch`.
#[derive(Clone, Default)]
pub struct MulchExpertise;

impl MulchExpertise {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExpertiseClient for MulchExpertise {
    async fn suggest_domains(&self, files: &[String]) -> Result<Vec<String>, ExpertiseError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = Command::new("mulch");
        cmd.args(["suggest", "--json"]).args(files);
        let output = run_with_timeout(cmd, EXPERTISE_TIMEOUT, "mulch suggest")
            .await
            .map_err(ExpertiseError::CommandFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExpertiseError::CommandFailed(stderr.trim().to_string()));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ExpertiseError::CommandFailed(format!("invalid mulch output: {}", e)))?;

        Ok(json
            .get("domains")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn record(&self, domain: &str, note: &str) -> Result<(), ExpertiseError> {
        let mut cmd = Command::new("mulch");
        cmd.args(["record", domain, note]);
        let output = run_with_timeout(cmd, EXPERTISE_TIMEOUT, "mulch record")
            .await
            .map_err(ExpertiseError::CommandFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExpertiseError::CommandFailed(stderr.trim().to_string()));
        }
        Ok(())
    }
}

/// Fake expertise client for testing
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeExpertise {
    inner: std::sync::Arc<parking_lot::Mutex<FakeExpertiseState>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeExpertiseState {
    domains: Vec<String>,
    recorded: Vec<(String, String)>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeExpertise {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_domains(&self, domains: &[&str]) {
        self.inner.lock().domains = domains.iter().map(|s| s.to_string()).collect();
    }

    pub fn recorded(&self) -> Vec<(String, String)> {
        self.inner.lock().recorded.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ExpertiseClient for FakeExpertise {
    async fn suggest_domains(&self, _files: &[String]) -> Result<Vec<String>, ExpertiseError> {
        Ok(self.inner.lock().domains.clone())
    }

    async fn record(&self, domain: &str, note: &str) -> Result<(), ExpertiseError> {
        self.inner
            .lock()
            .recorded
            .push((domain.to_string(), note.to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "expertise_tests.rs"]
mod tests;
