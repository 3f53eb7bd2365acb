//! The [`Session`] struct — the core persisted session record.
//!
//! A session is one long-lived terminal-multiplexer session bound to a
//! working directory. Sessions are stored flat: overlay attributes (flag,
//! status, comment, archive, dangerous permissions) live in their own tables
//! but surface here as plain fields so callers see one assembled record.
//!
//! A session may own exactly one nested [`ChildSession`] (an attached shell
//! in the same working tree). The child carries its own lifecycle state but
//! no overlays, no position, and no further nesting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::UNKNOWN_EXECUTION_ID;
use crate::state::AgentState;

/// A top-level agent session.
///
/// The canonical wire format is camelCase JSON. `name` doubles as the
/// multiplexer session identifier and the storage primary key; every other
/// process addressing this session uses it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session name (also the multiplexer session name).
    pub name: String,
    /// Human-facing display name.
    pub display_name: String,
    /// Current agent lifecycle state.
    #[serde(default)]
    pub state: AgentState,
    /// Correlation id of the front-end run that last touched this session.
    #[serde(default = "unknown_execution_id")]
    pub execution_id: String,
    /// Shared checkout root this session works against.
    #[serde(default)]
    pub repo_path: String,
    /// This session's isolated working tree (empty when working in-place).
    #[serde(default)]
    pub worktree_path: String,
    /// Branch checked out in the working tree.
    #[serde(default)]
    pub branch_name: String,
    /// Short human identifier for the repository (e.g. "owner/repo").
    #[serde(default)]
    pub repo_info: String,
    /// Original clone URL or path the checkout came from.
    #[serde(default)]
    pub repo_source: String,
    /// The agent's per-session config directory.
    #[serde(default)]
    pub claude_dir: String,
    /// Ordering index among top-level sessions (dense, zero-based).
    #[serde(default)]
    pub position: i64,
    /// RFC 3339 timestamp of the last state-bearing update.
    pub last_updated: String,
    /// Nested shell session, if one is attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<ChildSession>,
    /// Flag overlay: whether the session is flagged.
    #[serde(default)]
    pub flagged: bool,
    /// RFC 3339 timestamp of when the flag was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_at: Option<String>,
    /// Status overlay: short free-form label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Comment overlay: free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Archive overlay: whether the session is archived (soft-hidden).
    #[serde(default)]
    pub archived: bool,
    /// RFC 3339 timestamp of when the session was archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
    /// Dangerous-permission overlay: agent runs with permission checks off.
    #[serde(default)]
    pub skip_permissions: bool,
}

fn unknown_execution_id() -> String {
    UNKNOWN_EXECUTION_ID.to_string()
}

impl Session {
    /// Create a session with the given name and defaults everywhere else.
    ///
    /// The display name mirrors the name, the state is idle, the execution
    /// id is the unknown sentinel, and `last_updated` is stamped now.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            state: AgentState::default(),
            execution_id: unknown_execution_id(),
            repo_path: String::new(),
            worktree_path: String::new(),
            branch_name: String::new(),
            repo_info: String::new(),
            repo_source: String::new(),
            claude_dir: String::new(),
            position: 0,
            last_updated: now_rfc3339(),
            child: None,
            flagged: false,
            flagged_at: None,
            status: None,
            comment: None,
            archived: false,
            archived_at: None,
            skip_permissions: false,
        }
    }
}

/// A nested shell session attached to a top-level [`Session`].
///
/// Same lifecycle shape as its parent but restricted: no overlays, no
/// position, no nested child of its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSession {
    /// Unique session name (shares the namespace with top-level sessions).
    pub name: String,
    /// Human-facing display name.
    pub display_name: String,
    /// Current agent lifecycle state.
    #[serde(default)]
    pub state: AgentState,
    /// Correlation id of the front-end run that last touched this session.
    #[serde(default = "unknown_execution_id")]
    pub execution_id: String,
    /// Working tree the shell runs in (usually the parent's).
    #[serde(default)]
    pub worktree_path: String,
    /// RFC 3339 timestamp of the last state-bearing update.
    pub last_updated: String,
}

impl ChildSession {
    /// Create a child session with the given name and defaults elsewhere.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            state: AgentState::default(),
            execution_id: unknown_execution_id(),
            worktree_path: String::new(),
            last_updated: now_rfc3339(),
        }
    }
}

/// Current UTC time as an RFC 3339 string.
#[must_use]
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered view of every top-level session.
///
/// `order` lists session names by position; `sessions` maps name to the
/// assembled record. Produced by store loads and consumed whole by store
/// saves, so a front end can hold, reorder, and write back the full set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Session names in position order.
    pub order: Vec<String>,
    /// Session records keyed by name.
    pub sessions: HashMap<String, Session>,
}

impl SessionSnapshot {
    /// Build a snapshot from a list of sessions, ordering by position
    /// (ties broken by name).
    #[must_use]
    pub fn from_sessions(mut sessions: Vec<Session>) -> Self {
        sessions.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
        let order = sessions.iter().map(|s| s.name.clone()).collect();
        let sessions = sessions.into_iter().map(|s| (s.name.clone(), s)).collect();
        Self { order, sessions }
    }

    /// Look up a session by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Session> {
        self.sessions.get(name)
    }

    /// Iterate sessions in position order.
    pub fn ordered(&self) -> impl Iterator<Item = &Session> {
        self.order.iter().filter_map(|name| self.sessions.get(name))
    }

    /// Number of sessions in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the snapshot holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
