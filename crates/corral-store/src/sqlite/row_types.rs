//! Row types mirroring the database schema.
//!
//! These are the raw shapes read from and written to SQLite. The store
//! facade assembles them (together with overlay rows) into the domain
//! [`corral_core::Session`] type.

use serde::{Deserialize, Serialize};

/// A row in the `sessions` table.
///
/// Top-level sessions have `parent_name = None`; a child shell session
/// points at its parent. `state` is stored as its lowercase string form
/// and parsed into [`corral_core::AgentState`] during assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Unique session name, also the tmux session name.
    pub name: String,
    /// Human-facing display name.
    pub display_name: String,
    /// Agent state as a lowercase string (`idle`, `working`, ...).
    pub state: String,
    /// Execution id of the server run that last touched this session.
    pub execution_id: String,
    /// Path to the shared repository checkout.
    pub repo_path: String,
    /// Path to this session's git worktree.
    pub worktree_path: String,
    /// Branch checked out in the worktree.
    pub branch_name: String,
    /// Free-form repository label shown in listings.
    pub repo_info: String,
    /// Normalized remote URL the checkout was cloned from.
    pub repo_source: String,
    /// Per-session agent config directory.
    pub claude_dir: String,
    /// Parent session name for child shells, `None` for top-level rows.
    pub parent_name: Option<String>,
    /// Ordering index among top-level sessions.
    pub position: i64,
    /// RFC 3339 timestamp of the last mutation.
    pub last_updated: String,
}

impl SessionRow {
    /// Whether this row is a top-level session.
    pub fn is_top_level(&self) -> bool {
        self.parent_name.is_none()
    }
}
