//! The VCS capability trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::Result;

/// Version control operations the rest of the system depends on.
///
/// Production code uses [`crate::GitCli`]; tests use [`crate::FakeVcs`].
/// Callers hold an `Arc<dyn Vcs>`.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether the path is inside a git working copy.
    async fn is_repo(&self, path: &Path) -> Result<bool>;

    /// The `origin` remote URL of the checkout at `path`.
    async fn remote_url(&self, path: &Path) -> Result<String>;

    /// Clone `url` into `path`, or fetch when the checkout already exists.
    async fn clone_or_fetch(&self, url: &str, path: &Path) -> Result<()>;

    /// Create a worktree for a new `branch` at `path`.
    async fn create_worktree(&self, repo: &Path, path: &Path, branch: &str) -> Result<()>;

    /// Remove the worktree at `path`.
    async fn remove_worktree(&self, repo: &Path, path: &Path) -> Result<()>;

    /// Repair worktree bookkeeping after the checkout or its worktrees
    /// moved on disk.
    async fn repair_worktrees(&self, repo: &Path, paths: &[PathBuf]) -> Result<()>;
}
