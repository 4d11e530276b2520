// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake multiplexer adapter for testing

use super::{MuxAdapter, MuxError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded multiplexer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxCall {
    Create {
        name: String,
        cwd: PathBuf,
        cmd: String,
        env: Vec<(String, String)>,
    },
    Kill { name: String },
    SendKeys { name: String, text: String },
    SendEnter { name: String },
    Capture { name: String },
}

#[derive(Debug, Clone)]
struct FakeSession {
    alive: bool,
    pane_pid: Option<u32>,
    capture: String,
}

#[derive(Default)]
struct FakeMuxState {
    sessions: HashMap<String, FakeSession>,
    calls: Vec<MuxCall>,
    fail_create: bool,
}

/// Fake multiplexer adapter for testing
#[derive(Clone, Default)]
pub struct FakeMuxAdapter {
    inner: Arc<Mutex<FakeMuxState>>,
}

impl FakeMuxAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create` call fail.
    pub fn fail_next_create(&self) {
        self.inner.lock().fail_create = true;
    }

    /// Script a session into existence without going through `create`.
    pub fn add_session(&self, name: &str, alive: bool, pane_pid: Option<u32>) {
        self.inner.lock().sessions.insert(
            name.to_string(),
            FakeSession {
                alive,
                pane_pid,
                capture: "$ ".to_string(),
            },
        );
    }

    pub fn set_capture(&self, name: &str, content: &str) {
        if let Some(s) = self.inner.lock().sessions.get_mut(name) {
            s.capture = content.to_string();
        }
    }

    pub fn kill_pane(&self, name: &str) {
        if let Some(s) = self.inner.lock().sessions.get_mut(name) {
            s.alive = false;
            s.pane_pid = None;
        }
    }

    pub fn calls(&self) -> Vec<MuxCall> {
        self.inner.lock().calls.clone()
    }

    pub fn sent_keys(&self, name: &str) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MuxCall::SendKeys { name: n, text } if n == name => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn enter_count(&self, name: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MuxCall::SendEnter { name: n } if n == name))
            .count()
    }

    pub fn is_alive(&self, name: &str) -> bool {
        self.inner
            .lock()
            .sessions
            .get(name)
            .is_some_and(|s| s.alive)
    }
}

#[async_trait]
impl MuxAdapter for FakeMuxAdapter {
    async fn create(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::Create {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
            cmd: cmd.to_string(),
            env: env.to_vec(),
        });
        if state.fail_create {
            state.fail_create = false;
            return Err(MuxError::CreateFailed("scripted failure".to_string()));
        }
        let pid = 40_000 + state.sessions.len() as u32;
        state.sessions.insert(
            name.to_string(),
            FakeSession {
                alive: true,
                pane_pid: Some(pid),
                capture: "$ ".to_string(),
            },
        );
        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::Kill {
            name: name.to_string(),
        });
        if let Some(s) = state.sessions.get_mut(name) {
            s.alive = false;
            s.pane_pid = None;
        }
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, MuxError> {
        Ok(self.is_alive(name))
    }

    async fn list(&self) -> Result<Vec<String>, MuxError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .iter()
            .filter(|(_, s)| s.alive)
            .map(|(n, _)| n.clone())
            .collect())
    }

    async fn send_keys(&self, name: &str, text: &str) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::SendKeys {
            name: name.to_string(),
            text: text.to_string(),
        });
        if !state.sessions.get(name).is_some_and(|s| s.alive) {
            return Err(MuxError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send_enter(&self, name: &str) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::SendEnter {
            name: name.to_string(),
        });
        if !state.sessions.get(name).is_some_and(|s| s.alive) {
            return Err(MuxError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn capture(&self, name: &str) -> Result<String, MuxError> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::Capture {
            name: name.to_string(),
        });
        state
            .sessions
            .get(name)
            .filter(|s| s.alive)
            .map(|s| s.capture.clone())
            .ok_or_else(|| MuxError::NotFound(name.to_string()))
    }

    async fn pane_pid(&self, name: &str) -> Result<Option<u32>, MuxError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .get(name)
            .and_then(|s| s.pane_pid))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
