//! Path rewriting between state roots.

use std::path::{Path, PathBuf};

use corral_core::Session;

/// Subdirectory of the state root holding per-session working trees.
pub const WORKTREES_DIR: &str = "worktrees";

/// Rebase `path` from `source_root` onto `dest_root`.
///
/// Returns `None` when the path is empty or not rooted under the source
/// root; such paths are outside the migration's jurisdiction and are left
/// untouched.
#[must_use]
pub fn rebase(path: &str, source_root: &Path, dest_root: &Path) -> Option<PathBuf> {
    if path.is_empty() {
        return None;
    }
    let relative = Path::new(path).strip_prefix(source_root).ok()?;
    Some(dest_root.join(relative))
}

/// Rewrite a session's path fields from the source root to the destination
/// root by prefix substitution.
#[must_use]
pub fn rewrite_session(session: &Session, source_root: &Path, dest_root: &Path) -> Session {
    let mut rewritten = session.clone();
    for field in [
        &mut rewritten.repo_path,
        &mut rewritten.worktree_path,
        &mut rewritten.claude_dir,
    ] {
        if let Some(moved) = rebase(field, source_root, dest_root) {
            *field = moved.to_string_lossy().into_owned();
        }
    }
    if let Some(child) = &mut rewritten.child {
        if let Some(moved) = rebase(&child.worktree_path, source_root, dest_root) {
            child.worktree_path = moved.to_string_lossy().into_owned();
        }
    }
    rewritten
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::ChildSession;

    #[test]
    fn rebase_moves_rooted_paths() {
        let moved = rebase(
            "/old/root/worktrees/alpha",
            Path::new("/old/root"),
            Path::new("/new/root"),
        );
        assert_eq!(moved, Some(PathBuf::from("/new/root/worktrees/alpha")));
    }

    #[test]
    fn rebase_skips_unrooted_paths() {
        assert_eq!(
            rebase("/elsewhere/repo", Path::new("/old/root"), Path::new("/new/root")),
            None
        );
    }

    #[test]
    fn rebase_skips_empty_paths() {
        assert_eq!(rebase("", Path::new("/old/root"), Path::new("/new/root")), None);
    }

    #[test]
    fn rewrite_touches_only_rooted_fields() {
        let mut session = Session::new("alpha");
        session.repo_path = "/old/root/repos/project".to_string();
        session.worktree_path = "/old/root/worktrees/alpha".to_string();
        session.claude_dir = "/home/user/.claude".to_string();

        let rewritten = rewrite_session(&session, Path::new("/old/root"), Path::new("/new/root"));

        assert_eq!(rewritten.repo_path, "/new/root/repos/project");
        assert_eq!(rewritten.worktree_path, "/new/root/worktrees/alpha");
        assert_eq!(rewritten.claude_dir, "/home/user/.claude");
        assert_eq!(rewritten.name, "alpha");
    }

    #[test]
    fn rewrite_carries_the_child_worktree() {
        let mut session = Session::new("alpha");
        let mut child = ChildSession::new("alpha-shell");
        child.worktree_path = "/old/root/worktrees/alpha".to_string();
        session.child = Some(child);

        let rewritten = rewrite_session(&session, Path::new("/old/root"), Path::new("/new/root"));

        assert_eq!(
            rewritten.child.unwrap().worktree_path,
            "/new/root/worktrees/alpha"
        );
    }
}
