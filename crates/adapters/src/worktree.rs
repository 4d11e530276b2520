// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree adapter.
//!
//! Every worker agent gets an isolated checkout on a private branch. The
//! adapter wraps `git worktree` subprocess invocation; branch naming policy
//! lives with the caller.

use crate::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Errors from worktree operations
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("git failed: {0}")]
    GitFailed(String),
}

/// Adapter for managing per-agent working copies.
#[async_trait]
pub trait WorktreeAdapter: Clone + Send + Sync + 'static {
    /// Create a worktree at `path` on new branch `branch` from `base`.
    async fn add(&self, repo: &Path, path: &Path, branch: &str, base: &str)
        -> Result<(), WorktreeError>;

    /// Remove a worktree. Already-gone worktrees count as success.
    async fn remove(&self, repo: &Path, path: &Path) -> Result<(), WorktreeError>;

    /// Files changed on the worktree's branch relative to `base`.
    async fn changed_files(&self, worktree: &Path, base: &str)
        -> Result<Vec<String>, WorktreeError>;
}

/// Production adapter shelling out to git.
#[derive(Clone, Default)]
pub struct GitWorktree;

impl GitWorktree {
    pub fn new() -> Self {
        Self
    }

    async fn git(
        &self,
        cwd: &Path,
        args: &[&str],
        description: &str,
    ) -> Result<std::process::Output, WorktreeError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(cwd).args(args);
        run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, description)
            .await
            .map_err(WorktreeError::GitFailed)
    }
}

#[async_trait]
impl WorktreeAdapter for GitWorktree {
    async fn add(
        &self,
        repo: &Path,
        path: &Path,
        branch: &str,
        base: &str,
    ) -> Result<(), WorktreeError> {
        let path_str = path.display().to_string();
        let output = self
            .git(
                repo,
                &["worktree", "add", "-b", branch, &path_str, base],
                "git worktree add",
            )
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(branch, path = %path.display(), stderr = %stderr, "worktree add failed");
            return Err(WorktreeError::GitFailed(stderr.trim().to_string()));
        }
        Ok(())
    }

    async fn remove(&self, repo: &Path, path: &Path) -> Result<(), WorktreeError> {
        let path_str = path.display().to_string();
        let output = self
            .git(
                repo,
                &["worktree", "remove", "--force", &path_str],
                "git worktree remove",
            )
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.contains("is not a working tree") {
                tracing::debug!(path = %path.display(), stderr = %stderr, "worktree remove failed");
            }
            // Stale metadata is cleaned up regardless
            let _ = self.git(repo, &["worktree", "prune"], "git worktree prune").await;
        }
        Ok(())
    }

    async fn changed_files(
        &self,
        worktree: &Path,
        base: &str,
    ) -> Result<Vec<String>, WorktreeError> {
        let range = format!("{}...HEAD", base);
        let output = self
            .git(worktree, &["diff", "--name-only", &range], "git diff")
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorktreeError::GitFailed(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }
}

/// Fake worktree adapter for testing
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeWorktree {
    inner: std::sync::Arc<parking_lot::Mutex<FakeWorktreeState>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeWorktreeState {
    added: Vec<(std::path::PathBuf, String)>,
    removed: Vec<std::path::PathBuf>,
    changed: Vec<String>,
    fail_add: bool,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeWorktree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_add(&self) {
        self.inner.lock().fail_add = true;
    }

    pub fn set_changed_files(&self, files: &[&str]) {
        self.inner.lock().changed = files.iter().map(|s| s.to_string()).collect();
    }

    pub fn added(&self) -> Vec<(std::path::PathBuf, String)> {
        self.inner.lock().added.clone()
    }

    pub fn removed(&self) -> Vec<std::path::PathBuf> {
        self.inner.lock().removed.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WorktreeAdapter for FakeWorktree {
    async fn add(
        &self,
        _repo: &Path,
        path: &Path,
        branch: &str,
        _base: &str,
    ) -> Result<(), WorktreeError> {
        let mut state = self.inner.lock();
        if state.fail_add {
            state.fail_add = false;
            return Err(WorktreeError::GitFailed("scripted failure".to_string()));
        }
        // Engine code expects the directory to exist after add
        std::fs::create_dir_all(path)
            .map_err(|e| WorktreeError::GitFailed(e.to_string()))?;
        state.added.push((path.to_path_buf(), branch.to_string()));
        Ok(())
    }

    async fn remove(&self, _repo: &Path, path: &Path) -> Result<(), WorktreeError> {
        let _ = std::fs::remove_dir_all(path);
        self.inner.lock().removed.push(path.to_path_buf());
        Ok(())
    }

    async fn changed_files(
        &self,
        _worktree: &Path,
        _base: &str,
    ) -> Result<Vec<String>, WorktreeError> {
        Ok(self.inner.lock().changed.clone())
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
