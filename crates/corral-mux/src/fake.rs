//! In-memory fake multiplexer for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{MuxError, Result};
use crate::traits::Multiplexer;

/// A recorded fake session.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeSession {
    /// Session name.
    pub name: String,
    /// Working directory passed at creation.
    pub cwd: PathBuf,
    /// Environment pairs passed at creation.
    pub env: Vec<(String, String)>,
    /// Whether the agent probe reports a live process.
    pub agent_running: bool,
    /// Input lines sent through `send_keys`.
    pub sent: Vec<String>,
}

/// In-memory [`Multiplexer`] that records every operation.
#[derive(Default)]
pub struct FakeMultiplexer {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    sessions: HashMap<String, FakeSession>,
    killed: Vec<String>,
    failing_kills: Vec<String>,
}

impl FakeMultiplexer {
    /// Create an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live session without going through `create`.
    pub fn seed(&self, name: &str) {
        let mut state = self.state.lock();
        let _ = state.sessions.insert(
            name.to_string(),
            FakeSession {
                name: name.to_string(),
                cwd: PathBuf::new(),
                env: Vec::new(),
                agent_running: true,
                sent: Vec::new(),
            },
        );
    }

    /// Make every `kill` of the given name fail.
    pub fn fail_kill(&self, name: &str) {
        self.state.lock().failing_kills.push(name.to_string());
    }

    /// Set whether the agent probe reports a live process.
    pub fn set_agent_running(&self, name: &str, running: bool) {
        if let Some(session) = self.state.lock().sessions.get_mut(name) {
            session.agent_running = running;
        }
    }

    /// Names passed to `kill` in call order, failed attempts included.
    pub fn killed(&self) -> Vec<String> {
        self.state.lock().killed.clone()
    }

    /// Snapshot of a session's record, if it is live.
    pub fn session(&self, name: &str) -> Option<FakeSession> {
        self.state.lock().sessions.get(name).cloned()
    }
}

#[async_trait]
impl Multiplexer for FakeMultiplexer {
    async fn create(&self, name: &str, cwd: &Path, env: &[(String, String)]) -> Result<()> {
        let mut state = self.state.lock();
        if state.sessions.contains_key(name) {
            return Err(MuxError::CommandFailed {
                command: format!("new-session -d -s {name}"),
                stderr: format!("duplicate session: {name}"),
            });
        }
        let _ = state.sessions.insert(
            name.to_string(),
            FakeSession {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
                env: env.to_vec(),
                agent_running: true,
                sent: Vec::new(),
            },
        );
        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.killed.push(name.to_string());
        if state.failing_kills.iter().any(|n| n == name) {
            return Err(MuxError::CommandFailed {
                command: format!("kill-session -t {name}"),
                stderr: "simulated kill failure".to_string(),
            });
        }
        if state.sessions.remove(name).is_none() {
            return Err(MuxError::SessionNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().sessions.contains_key(name))
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.state.lock().sessions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn send_keys(&self, name: &str, input: &str) -> Result<()> {
        let mut state = self.state.lock();
        match state.sessions.get_mut(name) {
            Some(session) => {
                session.sent.push(input.to_string());
                Ok(())
            }
            None => Err(MuxError::SessionNotFound(name.to_string())),
        }
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut state = self.state.lock();
        match state.sessions.remove(old_name) {
            Some(mut session) => {
                session.name = new_name.to_string();
                let _ = state.sessions.insert(new_name.to_string(), session);
                Ok(())
            }
            None => Err(MuxError::SessionNotFound(old_name.to_string())),
        }
    }

    async fn agent_running(&self, name: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .sessions
            .get(name)
            .is_some_and(|s| s.agent_running))
    }
}
