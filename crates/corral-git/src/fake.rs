//! In-memory fake VCS for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{GitError, Result};
use crate::traits::Vcs;

/// In-memory [`Vcs`] that records every operation.
#[derive(Default)]
pub struct FakeVcs {
    state: Mutex<FakeVcsState>,
}

#[derive(Default)]
struct FakeVcsState {
    repos: HashMap<PathBuf, String>,
    worktrees: HashMap<PathBuf, (PathBuf, String)>,
    cloned: Vec<(String, PathBuf)>,
    fetched: Vec<PathBuf>,
    removed: Vec<PathBuf>,
    repaired: Vec<(PathBuf, Vec<PathBuf>)>,
    fail_repair: bool,
}

impl FakeVcs {
    /// Create an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checkout at `path` with the given remote URL.
    pub fn seed_repo(&self, path: &Path, remote: &str) {
        let mut state = self.state.lock();
        let _ = state.repos.insert(path.to_path_buf(), remote.to_string());
    }

    /// Make every `repair_worktrees` call fail.
    pub fn fail_repair(&self) {
        self.state.lock().fail_repair = true;
    }

    /// Repair calls in order: `(repo, moved worktree paths)`.
    pub fn repaired(&self) -> Vec<(PathBuf, Vec<PathBuf>)> {
        self.state.lock().repaired.clone()
    }

    /// Clone calls in order: `(url, target path)`.
    pub fn cloned(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().cloned.clone()
    }

    /// Checkouts that were fetched instead of cloned.
    pub fn fetched(&self) -> Vec<PathBuf> {
        self.state.lock().fetched.clone()
    }

    /// Worktree paths passed to `remove_worktree`.
    pub fn removed(&self) -> Vec<PathBuf> {
        self.state.lock().removed.clone()
    }

    /// The `(repo, branch)` a worktree was created with, if any.
    pub fn worktree(&self, path: &Path) -> Option<(PathBuf, String)> {
        self.state.lock().worktrees.get(path).cloned()
    }
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn is_repo(&self, path: &Path) -> Result<bool> {
        Ok(self.state.lock().repos.contains_key(path))
    }

    async fn remote_url(&self, path: &Path) -> Result<String> {
        self.state
            .lock()
            .repos
            .get(path)
            .cloned()
            .ok_or_else(|| GitError::NotARepo(path.to_path_buf()))
    }

    async fn clone_or_fetch(&self, url: &str, path: &Path) -> Result<()> {
        let mut state = self.state.lock();
        if state.repos.contains_key(path) {
            state.fetched.push(path.to_path_buf());
        } else {
            let _ = state.repos.insert(path.to_path_buf(), url.to_string());
            state.cloned.push((url.to_string(), path.to_path_buf()));
        }
        Ok(())
    }

    async fn create_worktree(&self, repo: &Path, path: &Path, branch: &str) -> Result<()> {
        let mut state = self.state.lock();
        let _ = state
            .worktrees
            .insert(path.to_path_buf(), (repo.to_path_buf(), branch.to_string()));
        Ok(())
    }

    async fn remove_worktree(&self, _repo: &Path, path: &Path) -> Result<()> {
        let mut state = self.state.lock();
        state.removed.push(path.to_path_buf());
        if state.worktrees.remove(path).is_none() {
            return Err(GitError::CommandFailed {
                command: format!("git worktree remove {}", path.display()),
                stderr: "is not a working tree".to_string(),
            });
        }
        Ok(())
    }

    async fn repair_worktrees(&self, repo: &Path, paths: &[PathBuf]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_repair {
            return Err(GitError::CommandFailed {
                command: "git worktree repair".to_string(),
                stderr: "simulated repair failure".to_string(),
            });
        }
        state.repaired.push((repo.to_path_buf(), paths.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_repo_is_visible() {
        let vcs = FakeVcs::new();
        vcs.seed_repo(Path::new("/srv/repo"), "git@example.com:o/r");

        assert!(vcs.is_repo(Path::new("/srv/repo")).await.unwrap());
        assert!(!vcs.is_repo(Path::new("/srv/other")).await.unwrap());
        assert_eq!(
            vcs.remote_url(Path::new("/srv/repo")).await.unwrap(),
            "git@example.com:o/r"
        );
    }

    #[tokio::test]
    async fn remote_url_of_unknown_path_is_not_a_repo() {
        let vcs = FakeVcs::new();
        let err = vcs.remote_url(Path::new("/srv/none")).await.unwrap_err();
        assert!(matches!(err, GitError::NotARepo(_)));
    }

    #[tokio::test]
    async fn clone_then_fetch() {
        let vcs = FakeVcs::new();
        let path = PathBuf::from("/srv/repo");

        vcs.clone_or_fetch("https://example.com/o/r.git", &path)
            .await
            .unwrap();
        assert_eq!(
            vcs.cloned(),
            vec![("https://example.com/o/r.git".to_string(), path.clone())]
        );

        vcs.clone_or_fetch("https://example.com/o/r.git", &path)
            .await
            .unwrap();
        assert_eq!(vcs.fetched(), vec![path]);
    }

    #[tokio::test]
    async fn worktree_create_and_remove() {
        let vcs = FakeVcs::new();
        let repo = PathBuf::from("/srv/repo");
        let wt = PathBuf::from("/srv/worktrees/alpha");

        vcs.create_worktree(&repo, &wt, "corral/alpha").await.unwrap();
        assert_eq!(
            vcs.worktree(&wt),
            Some((repo.clone(), "corral/alpha".to_string()))
        );

        vcs.remove_worktree(&repo, &wt).await.unwrap();
        assert!(vcs.worktree(&wt).is_none());

        let err = vcs.remove_worktree(&repo, &wt).await.unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn repair_records_paths() {
        let vcs = FakeVcs::new();
        let repo = PathBuf::from("/dst/repo");
        let paths = vec![PathBuf::from("/dst/worktrees/alpha")];

        vcs.repair_worktrees(&repo, &paths).await.unwrap();
        assert_eq!(vcs.repaired(), vec![(repo, paths)]);
    }

    #[tokio::test]
    async fn forced_repair_failure() {
        let vcs = FakeVcs::new();
        vcs.fail_repair();

        let err = vcs
            .repair_worktrees(Path::new("/dst/repo"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { .. }));
    }
}
