//! tmux-backed multiplexer adapter.
//!
//! Every operation shells out to the tmux binary with `tokio::process` and
//! maps non-zero exits to [`MuxError::CommandFailed`] with the captured
//! stderr. Probes (`exists`, `agent_running`, `list`) treat a dead tmux
//! server as absence rather than failure.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{MuxError, Result};
use crate::traits::Multiplexer;

/// Pane commands that count as a live agent process.
const AGENT_COMMANDS: &[&str] = &["claude", "node"];

/// Multiplexer backed by the `tmux` binary.
pub struct TmuxMultiplexer {
    bin: String,
}

impl TmuxMultiplexer {
    /// Create an adapter shelling out to the given tmux binary.
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run(&self, args: &[String]) -> Result<std::process::Output> {
        let command = format!("{} {}", self.bin, args.join(" "));
        debug!(%command, "running tmux");
        tokio::process::Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| MuxError::Spawn { command, source: e })
    }

    async fn run_checked(&self, args: &[String]) -> Result<std::process::Output> {
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(MuxError::CommandFailed {
                command: format!("{} {}", self.bin, args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl Default for TmuxMultiplexer {
    fn default() -> Self {
        Self::new("tmux")
    }
}

#[async_trait]
impl Multiplexer for TmuxMultiplexer {
    async fn create(&self, name: &str, cwd: &Path, env: &[(String, String)]) -> Result<()> {
        let _ = self.run_checked(&create_args(name, cwd, env)).await?;
        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<()> {
        let args = target_args("kill-session", name);
        let _ = self.run_checked(&args).await?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let args = target_args("has-session", name);
        let output = self.run(&args).await?;
        Ok(output.status.success())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let args = vec![
            "list-sessions".to_string(),
            "-F".to_string(),
            "#{session_name}".to_string(),
        ];
        let output = self.run(&args).await?;
        if !output.status.success() {
            // No server running: no sessions.
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    async fn send_keys(&self, name: &str, input: &str) -> Result<()> {
        let mut args = target_args("send-keys", name);
        args.push(input.to_string());
        args.push("Enter".to_string());
        let _ = self.run_checked(&args).await?;
        Ok(())
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut args = target_args("rename-session", old_name);
        args.push(new_name.to_string());
        let _ = self.run_checked(&args).await?;
        Ok(())
    }

    async fn agent_running(&self, name: &str) -> Result<bool> {
        let mut args = target_args("list-panes", name);
        args.push("-F".to_string());
        args.push("#{pane_current_command}".to_string());
        let output = self.run(&args).await?;
        if !output.status.success() {
            // Missing session or dead server: no agent.
            return Ok(false);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(is_agent_command))
    }
}

fn target_args(subcommand: &str, name: &str) -> Vec<String> {
    vec![subcommand.to_string(), "-t".to_string(), name.to_string()]
}

fn create_args(name: &str, cwd: &Path, env: &[(String, String)]) -> Vec<String> {
    let mut args = vec![
        "new-session".to_string(),
        "-d".to_string(),
        "-s".to_string(),
        name.to_string(),
        "-c".to_string(),
        cwd.to_string_lossy().into_owned(),
    ];
    for (key, value) in env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    args
}

fn is_agent_command(command: &str) -> bool {
    let trimmed = command.trim();
    AGENT_COMMANDS.iter().any(|agent| trimmed == *agent)
}
