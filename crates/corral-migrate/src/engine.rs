//! Migration of sessions and their filesystem state between state roots.
//!
//! The engine drives two independent stores (source, destination) plus the
//! multiplexer and VCS adapters. Record moves are transactional per store;
//! filesystem moves are not, so the phase ordering is arranged to keep the
//! source copy authoritative until the destination copy is confirmed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use corral_core::Session;
use corral_git::{same_remote, Vcs};
use corral_mux::Multiplexer;
use corral_store::SessionStore;
use tracing::{info, instrument, warn};

use crate::errors::{MigrateError, Result};
use crate::fsops;
use crate::paths;

/// Outcome of a migration run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Names moved to the destination, in processing order.
    pub moved: Vec<String>,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<String>,
}

/// Moves sessions between two state roots.
pub struct MigrationEngine {
    source: SessionStore,
    dest: SessionStore,
    source_root: PathBuf,
    dest_root: PathBuf,
    mux: Arc<dyn Multiplexer>,
    vcs: Arc<dyn Vcs>,
}

impl MigrationEngine {
    /// Create an engine over two opened stores and their state roots.
    pub fn new(
        source: SessionStore,
        source_root: PathBuf,
        dest: SessionStore,
        dest_root: PathBuf,
        mux: Arc<dyn Multiplexer>,
        vcs: Arc<dyn Vcs>,
    ) -> Self {
        Self {
            source,
            dest,
            source_root,
            dest_root,
            mux,
            vcs,
        }
    }

    /// Move every session of one repository, along with its shared checkout.
    ///
    /// Fails before touching anything when no session matches or when the
    /// selected sessions disagree on the shared checkout path.
    #[instrument(skip(self))]
    pub async fn migrate_repo(&self, repo_info: &str) -> Result<MigrationReport> {
        let sessions: Vec<Session> = self
            .source
            .list(true)?
            .into_iter()
            .filter(|s| s.repo_info == repo_info)
            .collect();
        if sessions.is_empty() {
            return Err(MigrateError::NoSessions(repo_info.to_string()));
        }
        let repo_path = sessions[0].repo_path.clone();
        for session in &sessions[1..] {
            if session.repo_path != repo_path {
                return Err(MigrateError::RepoMismatch {
                    repo_info: repo_info.to_string(),
                    first: repo_path,
                    second: session.repo_path.clone(),
                });
            }
        }

        let mut report = MigrationReport::default();
        for session in &sessions {
            self.kill_session(session, &mut report).await;
        }

        let new_repo_path = match paths::rebase(&repo_path, &self.source_root, &self.dest_root) {
            Some(dest) => {
                self.move_checkout(Path::new(&repo_path), &dest, &mut report)
                    .await?;
                dest
            }
            // Checkout lives outside the source root: shared in place.
            None => PathBuf::from(&repo_path),
        };

        let mut moved_worktrees = Vec::new();
        for session in &sessions {
            let rewritten = paths::rewrite_session(session, &self.source_root, &self.dest_root);
            if let Some(worktree) = self.move_worktree(session, &rewritten, &mut report) {
                moved_worktrees.push(worktree);
            }
            self.insert_into_dest(&rewritten)?;
        }

        if !moved_worktrees.is_empty() {
            if let Err(err) = self.vcs.repair_worktrees(&new_repo_path, &moved_worktrees).await {
                warn!(%err, "worktree repair failed");
                report.warnings.push(format!("worktree repair failed: {err}"));
            }
        }

        for session in &sessions {
            self.source.delete(&session.name)?;
            report.moved.push(session.name.clone());
        }

        info!(
            moved = report.moved.len(),
            warnings = report.warnings.len(),
            "repository migration complete"
        );
        Ok(report)
    }

    /// Move an explicit list of sessions through copy, verify, and delete
    /// phases. Each phase completes across the full batch before the next
    /// begins, so a failure never leaves a session deleted before its
    /// destination copy has been confirmed.
    #[instrument(skip(self, names), fields(count = names.len()))]
    pub async fn migrate_sessions(&self, names: &[String]) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        let copied = self.copy_phase(names, &mut report).await?;
        self.verify_phase(&copied)?;
        self.delete_phase(&copied, &mut report)?;

        info!(
            moved = report.moved.len(),
            warnings = report.warnings.len(),
            "session migration complete"
        );
        Ok(report)
    }

    async fn copy_phase(
        &self,
        names: &[String],
        report: &mut MigrationReport,
    ) -> Result<Vec<String>> {
        let mut copied = Vec::with_capacity(names.len());
        for name in names {
            let session = self.source.get(name)?;
            self.kill_session(&session, report).await;
            let rewritten = paths::rewrite_session(&session, &self.source_root, &self.dest_root);
            let _ = self.move_worktree(&session, &rewritten, report);
            self.insert_into_dest(&rewritten)?;
            copied.push(rewritten.name);
        }
        Ok(copied)
    }

    fn verify_phase(&self, copied: &[String]) -> Result<()> {
        for name in copied {
            let _ = self
                .dest
                .get(name)
                .map_err(|source| MigrateError::VerificationFailed {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    fn delete_phase(&self, copied: &[String], report: &mut MigrationReport) -> Result<()> {
        for name in copied {
            self.source.delete(name)?;
            report.moved.push(name.clone());
        }
        Ok(())
    }

    /// Best-effort kill of a session's multiplexer session(s), child first.
    async fn kill_session(&self, session: &Session, report: &mut MigrationReport) {
        if let Some(child) = &session.child {
            if let Err(err) = self.mux.kill(&child.name).await {
                warn!(session = %child.name, %err, "failed to kill multiplexer session");
                report
                    .warnings
                    .push(format!("failed to kill session {}: {err}", child.name));
            }
        }
        if let Err(err) = self.mux.kill(&session.name).await {
            warn!(session = %session.name, %err, "failed to kill multiplexer session");
            report
                .warnings
                .push(format!("failed to kill session {}: {err}", session.name));
        }
    }

    /// Move the shared checkout, reusing a destination checkout that points
    /// at the same remote and refusing one that does not.
    async fn move_checkout(
        &self,
        source: &Path,
        dest: &Path,
        report: &mut MigrationReport,
    ) -> Result<()> {
        if dest.exists() {
            let existing = self.vcs.remote_url(dest).await?;
            let expected = self.vcs.remote_url(source).await?;
            if same_remote(&existing, &expected) {
                report.warnings.push(format!(
                    "reusing existing checkout at {}; source checkout left at {}",
                    dest.display(),
                    source.display()
                ));
                return Ok(());
            }
            return Err(MigrateError::RepoConflict {
                path: dest.to_path_buf(),
                existing,
                expected,
            });
        }
        fsops::move_dir(source, dest)?;
        Ok(())
    }

    /// Move a session's working tree; failures downgrade to warnings.
    fn move_worktree(
        &self,
        original: &Session,
        rewritten: &Session,
        report: &mut MigrationReport,
    ) -> Option<PathBuf> {
        if original.worktree_path.is_empty() || rewritten.worktree_path == original.worktree_path {
            return None;
        }
        let source = Path::new(&original.worktree_path);
        let dest = Path::new(&rewritten.worktree_path);
        match fsops::move_dir(source, dest) {
            Ok(()) => Some(dest.to_path_buf()),
            Err(err) => {
                warn!(worktree = %source.display(), %err, "failed to move worktree");
                report.warnings.push(format!(
                    "failed to move worktree {}: {err}",
                    source.display()
                ));
                None
            }
        }
    }

    /// Insert a rewritten session into the destination and re-apply its
    /// annotation overlays through the public store operations.
    fn insert_into_dest(&self, session: &Session) -> Result<()> {
        let _ = self.dest.add(session)?;
        if let Some(comment) = &session.comment {
            self.dest.update_comment(&session.name, comment)?;
        }
        if let Some(status) = &session.status {
            self.dest.update_status(&session.name, status)?;
        }
        if session.flagged {
            let _ = self.dest.toggle_flag(&session.name)?;
        }
        if session.archived {
            let _ = self.dest.toggle_archive(&session.name)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
