//! git-CLI-backed VCS adapter.
//!
//! Shells out to the git binary with `tokio::process`, targeting a
//! repository with `-C`. Non-zero exits map to [`GitError::CommandFailed`]
//! with the captured stderr; `is_repo` treats failure as "not a repo".

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{GitError, Result};
use crate::traits::Vcs;

/// VCS adapter backed by the `git` binary.
pub struct GitCli {
    bin: String,
}

impl GitCli {
    /// Create an adapter shelling out to the given git binary.
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run(&self, args: &[String]) -> Result<std::process::Output> {
        let command = format!("{} {}", self.bin, args.join(" "));
        debug!(%command, "running git");
        tokio::process::Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| GitError::Spawn { command, source: e })
    }

    async fn run_checked(&self, args: &[String]) -> Result<std::process::Output> {
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: format!("{} {}", self.bin, args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn is_repo(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        let args = repo_args(path, &["rev-parse", "--is-inside-work-tree"]);
        let output = self.run(&args).await?;
        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    async fn remote_url(&self, path: &Path) -> Result<String> {
        let args = repo_args(path, &["remote", "get-url", "origin"]);
        let output = self.run_checked(&args).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn clone_or_fetch(&self, url: &str, path: &Path) -> Result<()> {
        if path.join(".git").exists() {
            let args = repo_args(path, &["fetch", "--all", "--prune"]);
            let _ = self.run_checked(&args).await?;
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = vec![
            "clone".to_string(),
            url.to_string(),
            path.to_string_lossy().into_owned(),
        ];
        let _ = self.run_checked(&args).await?;
        Ok(())
    }

    async fn create_worktree(&self, repo: &Path, path: &Path, branch: &str) -> Result<()> {
        let mut args = repo_args(repo, &["worktree", "add"]);
        args.push(path.to_string_lossy().into_owned());
        args.push("-b".to_string());
        args.push(branch.to_string());
        let _ = self.run_checked(&args).await?;
        Ok(())
    }

    async fn remove_worktree(&self, repo: &Path, path: &Path) -> Result<()> {
        let mut args = repo_args(repo, &["worktree", "remove", "--force"]);
        args.push(path.to_string_lossy().into_owned());
        let _ = self.run_checked(&args).await?;
        Ok(())
    }

    async fn repair_worktrees(&self, repo: &Path, paths: &[PathBuf]) -> Result<()> {
        let mut args = repo_args(repo, &["worktree", "repair"]);
        for path in paths {
            args.push(path.to_string_lossy().into_owned());
        }
        let _ = self.run_checked(&args).await?;
        Ok(())
    }
}

fn repo_args(repo: &Path, rest: &[&str]) -> Vec<String> {
    let mut args = vec!["-C".to_string(), repo.to_string_lossy().into_owned()];
    args.extend(rest.iter().map(|s| (*s).to_string()));
    args
}
