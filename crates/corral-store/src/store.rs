//! Session store facade.
//!
//! [`SessionStore`] is the public API over the SQLite layer. Every operation
//! runs in a single transaction on a pooled connection, and busy/locked
//! errors are retried with linear backoff before surfacing as
//! [`SessionStoreError::Unavailable`].
//!
//! Multiple OS processes may share one database file. WAL mode plus the
//! per-connection busy timeout handle most contention; the retry loop covers
//! the rest.

use std::collections::HashMap;
use std::path::Path;
use std::thread;

use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

use corral_core::retry::{self, RetryOutcome, RetryPolicy};
use corral_core::session::{now_rfc3339, ChildSession, Session, SessionSnapshot};
use corral_core::AgentState;

use crate::errors::{Result, SessionStoreError};
use crate::sqlite::connection::{
    db_path, new_file, new_in_memory, ConnectionConfig, ConnectionPool, PooledConnection,
};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::{OverlayBundle, OverlayRepo, SessionRepo};
use crate::sqlite::row_types::SessionRow;

/// Configuration for opening a [`SessionStore`].
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    /// Connection pool settings.
    pub connection: ConnectionConfig,
    /// Retry policy for busy/locked errors.
    pub retry: RetryPolicy,
}

/// Durable session store backed by SQLite.
///
/// Cheap to clone is not a goal; open one per process and share by
/// reference. All methods are `&self` and safe to call from multiple
/// threads through the pool.
pub struct SessionStore {
    pool: ConnectionPool,
    retry: RetryPolicy,
}

impl SessionStore {
    /// Open (or create) the store under a state-root directory.
    ///
    /// Creates the directory if needed, opens the pool against
    /// `<state_root>/corral.db`, and runs pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the pool cannot
    /// be built, or a migration fails.
    pub fn open(state_root: &Path, config: &StoreConfig) -> Result<Self> {
        std::fs::create_dir_all(state_root)?;
        let path = db_path(state_root);
        let pool = new_file(&path, &config.connection)?;
        let conn = pool.get()?;
        let _ = run_migrations(&conn)?;
        drop(conn);
        info!(path = %path.display(), "session store opened");
        Ok(Self {
            pool,
            retry: config.retry.clone(),
        })
    }

    /// Open an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        let config = StoreConfig::default();
        let pool = new_in_memory(&config.connection)?;
        let conn = pool.get()?;
        let _ = run_migrations(&conn)?;
        drop(conn);
        Ok(Self {
            pool,
            retry: config.retry,
        })
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Run an operation with busy/locked retry.
    ///
    /// Each attempt checks out a fresh connection. Non-retryable errors
    /// return immediately; exhausting the policy on a busy error maps to
    /// [`SessionStoreError::Unavailable`] with the attempt count.
    fn with_retry<T>(&self, mut op: impl FnMut(&Connection) -> Result<T>) -> Result<T> {
        let outcome = retry::run(
            &self.retry,
            || {
                let conn = self.conn()?;
                op(&conn)
            },
            is_sqlite_busy_or_locked,
            thread::sleep,
        );
        finish_retry(outcome)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Load the full session state as an ordered snapshot.
    ///
    /// Top-level sessions come back ordered by position (ties broken by
    /// name), each with its child and overlays populated. Non-dense or
    /// duplicated positions are renumbered in the same transaction before
    /// the snapshot is built. Archived sessions keep their position but are
    /// filtered out unless `include_archived` is set.
    #[instrument(skip(self))]
    pub fn load(&self, include_archived: bool) -> Result<SessionSnapshot> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            let rows = SessionRepo::list_top_level(&tx)?;

            let mut renumbered = 0;
            let mut ordered_rows = Vec::with_capacity(rows.len());
            for (index, mut row) in rows.into_iter().enumerate() {
                let expected = index as i64;
                if row.position != expected {
                    let _ = SessionRepo::set_position(&tx, &row.name, expected)?;
                    row.position = expected;
                    renumbered += 1;
                }
                ordered_rows.push(row);
            }
            if renumbered > 0 {
                debug!(renumbered, "renumbered session positions");
            }

            let mut order = Vec::new();
            let mut sessions = HashMap::new();
            for row in ordered_rows {
                let session = Self::assemble(&tx, row)?;
                if !include_archived && session.archived {
                    continue;
                }
                order.push(session.name.clone());
                let _ = sessions.insert(session.name.clone(), session);
            }

            tx.commit()?;
            Ok(SessionSnapshot { order, sessions })
        })
    }

    /// Fetch one top-level session with child and overlays.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::SessionNotFound`] if the name is absent
    /// or refers to a child shell.
    pub fn get(&self, name: &str) -> Result<Session> {
        self.with_retry(|conn| Self::fetch_session(conn, name))
    }

    /// List top-level sessions ordered by position, without the
    /// renumbering side effect of [`SessionStore::load`].
    pub fn list(&self, include_archived: bool) -> Result<Vec<Session>> {
        self.with_retry(|conn| {
            let rows = SessionRepo::list_top_level(conn)?;
            let mut sessions = Vec::with_capacity(rows.len());
            for row in rows {
                let session = Self::assemble(conn, row)?;
                if !include_archived && session.archived {
                    continue;
                }
                sessions.push(session);
            }
            Ok(sessions)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a new session at the top of the ordering.
    ///
    /// The new position is `min(existing) - 1`, so newest sessions sort
    /// first. The child row (if any) and the dangerous-permission overlay
    /// (when set) are written in the same transaction; other overlays on
    /// the passed value are ignored and must be applied through their own
    /// operations. Returns the stored session.
    #[instrument(skip(self, session), fields(name = %session.name))]
    pub fn add(&self, session: &Session) -> Result<Session> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            let position = SessionRepo::min_position(&tx)?.map_or(0, |min| min - 1);
            SessionRepo::insert(&tx, &row_from_session(session, position))?;
            if let Some(child) = &session.child {
                SessionRepo::insert(&tx, &row_from_child(child, &session.name))?;
            }
            if session.skip_permissions {
                OverlayRepo::set_permission(&tx, &session.name)?;
            }
            tx.commit()?;
            Self::fetch_session(conn, &session.name)
        })
    }

    /// Delete a session. Child rows and overlays cascade.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::SessionNotFound`] when no row matched.
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> Result<()> {
        self.with_retry(|conn| {
            if SessionRepo::delete(conn, name)? {
                Ok(())
            } else {
                Err(SessionStoreError::SessionNotFound(name.to_string()))
            }
        })
    }

    /// Rename a session and set a new display name.
    ///
    /// Overlay rows and the child's parent reference follow the rename
    /// through `ON UPDATE CASCADE`.
    pub fn rename(&self, old_name: &str, new_name: &str, new_display_name: &str) -> Result<()> {
        self.with_retry(|conn| {
            let renamed =
                SessionRepo::rename(conn, old_name, new_name, new_display_name, &now_rfc3339())?;
            if renamed {
                Ok(())
            } else {
                Err(SessionStoreError::SessionNotFound(old_name.to_string()))
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Column updates
    // ─────────────────────────────────────────────────────────────────────

    /// Set a session's agent state, stamping the execution id that
    /// reported it and `last_updated`.
    #[instrument(skip(self))]
    pub fn update_state(&self, name: &str, state: AgentState, execution_id: &str) -> Result<()> {
        self.with_retry(|conn| {
            let updated =
                SessionRepo::update_state(conn, name, state.as_str(), execution_id, &now_rfc3339())?;
            if updated {
                Ok(())
            } else {
                Err(SessionStoreError::SessionNotFound(name.to_string()))
            }
        })
    }

    /// Resynchronize a session's execution id without touching
    /// `last_updated`.
    pub fn update_execution_id(&self, name: &str, execution_id: &str) -> Result<()> {
        self.with_retry(|conn| {
            let updated = SessionRepo::update_execution_id(conn, name, execution_id)?;
            if updated {
                Ok(())
            } else {
                Err(SessionStoreError::SessionNotFound(name.to_string()))
            }
        })
    }

    /// Set a session's normalized remote URL.
    pub fn update_repo_source(&self, name: &str, repo_source: &str) -> Result<()> {
        self.with_retry(|conn| {
            let updated =
                SessionRepo::update_repo_source(conn, name, repo_source, &now_rfc3339())?;
            if updated {
                Ok(())
            } else {
                Err(SessionStoreError::SessionNotFound(name.to_string()))
            }
        })
    }

    /// Set a session's agent config directory.
    pub fn update_claude_dir(&self, name: &str, claude_dir: &str) -> Result<()> {
        self.with_retry(|conn| {
            let updated = SessionRepo::update_claude_dir(conn, name, claude_dir, &now_rfc3339())?;
            if updated {
                Ok(())
            } else {
                Err(SessionStoreError::SessionNotFound(name.to_string()))
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Overlays
    // ─────────────────────────────────────────────────────────────────────

    /// Set or clear a session's comment. An empty value deletes the
    /// overlay row, so absence is the only "no comment" representation.
    pub fn update_comment(&self, name: &str, comment: &str) -> Result<()> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            Self::require_top_level(&tx, name)?;
            if comment.is_empty() {
                let _ = OverlayRepo::clear_comment(&tx, name)?;
            } else {
                OverlayRepo::set_comment(&tx, name, comment)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Set or clear a session's status label. An empty value deletes the
    /// overlay row.
    pub fn update_status(&self, name: &str, status: &str) -> Result<()> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            Self::require_top_level(&tx, name)?;
            if status.is_empty() {
                let _ = OverlayRepo::clear_status(&tx, name)?;
            } else {
                OverlayRepo::set_status(&tx, name, status)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Flip a session's flag, stamping a timestamp on set.
    ///
    /// Returns the new flagged value.
    pub fn toggle_flag(&self, name: &str) -> Result<bool> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            Self::require_top_level(&tx, name)?;
            let flagged = if OverlayRepo::has_flag(&tx, name)? {
                let _ = OverlayRepo::clear_flag(&tx, name)?;
                false
            } else {
                OverlayRepo::set_flag(&tx, name, &now_rfc3339())?;
                true
            };
            tx.commit()?;
            Ok(flagged)
        })
    }

    /// Flip a session's archived marker, stamping a timestamp on set.
    ///
    /// Returns the new archived value. Archived sessions keep their
    /// position and reappear on unarchive.
    pub fn toggle_archive(&self, name: &str) -> Result<bool> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            Self::require_top_level(&tx, name)?;
            let archived = if OverlayRepo::has_archive(&tx, name)? {
                let _ = OverlayRepo::clear_archive(&tx, name)?;
                false
            } else {
                OverlayRepo::set_archive(&tx, name, &now_rfc3339())?;
                true
            };
            tx.commit()?;
            Ok(archived)
        })
    }

    /// Set or clear the dangerous-permission overlay.
    pub fn update_skip_permissions(&self, name: &str, skip: bool) -> Result<()> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            Self::require_top_level(&tx, name)?;
            if skip {
                OverlayRepo::set_permission(&tx, name)?;
            } else {
                let _ = OverlayRepo::clear_permission(&tx, name)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ordering and bulk state
    // ─────────────────────────────────────────────────────────────────────

    /// Exchange the positions of two sessions atomically.
    pub fn swap_positions(&self, a: &str, b: &str) -> Result<()> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            let pos_a = SessionRepo::position_of(&tx, a)?
                .ok_or_else(|| SessionStoreError::SessionNotFound(a.to_string()))?;
            let pos_b = SessionRepo::position_of(&tx, b)?
                .ok_or_else(|| SessionStoreError::SessionNotFound(b.to_string()))?;
            let _ = SessionRepo::set_position(&tx, a, pos_b)?;
            let _ = SessionRepo::set_position(&tx, b, pos_a)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Replace the whole stored state with the snapshot.
    ///
    /// Rows absent from the snapshot are deleted. Everything present is
    /// upserted, overlays included. Position comes from the snapshot's
    /// ordering; names missing from the ordering keep their prior stored
    /// position, and new names append after the current maximum.
    #[instrument(skip(self, snapshot), fields(sessions = snapshot.len()))]
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            let now = now_rfc3339();

            let prior: HashMap<String, i64> = SessionRepo::list_top_level(&tx)?
                .into_iter()
                .map(|row| (row.name, row.position))
                .collect();

            let mut keep: Vec<&str> = Vec::new();
            for session in snapshot.sessions.values() {
                keep.push(session.name.as_str());
                if let Some(child) = &session.child {
                    keep.push(child.name.as_str());
                }
            }
            let _ = SessionRepo::delete_all_except(&tx, &keep)?;

            let order_index: HashMap<&str, i64> = snapshot
                .order
                .iter()
                .enumerate()
                .map(|(index, name)| (name.as_str(), index as i64))
                .collect();

            let mut next_append = prior
                .values()
                .copied()
                .chain(order_index.values().copied())
                .max()
                .map_or(0, |max| max + 1);

            let mut entries: Vec<(&String, &Session)> = snapshot.sessions.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            for (_, session) in entries {
                let position = order_index
                    .get(session.name.as_str())
                    .copied()
                    .or_else(|| prior.get(session.name.as_str()).copied())
                    .unwrap_or_else(|| {
                        let appended = next_append;
                        next_append += 1;
                        appended
                    });
                SessionRepo::upsert(&tx, &row_from_session(session, position))?;
                if let Some(child) = &session.child {
                    SessionRepo::upsert(&tx, &row_from_child(child, &session.name))?;
                }
                OverlayRepo::apply(&tx, &session.name, &bundle_from_session(session, &now))?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Assembly
    // ─────────────────────────────────────────────────────────────────────

    fn fetch_session(conn: &Connection, name: &str) -> Result<Session> {
        let row = SessionRepo::get(conn, name)?
            .filter(SessionRow::is_top_level)
            .ok_or_else(|| SessionStoreError::SessionNotFound(name.to_string()))?;
        Self::assemble(conn, row)
    }

    fn require_top_level(conn: &Connection, name: &str) -> Result<()> {
        match SessionRepo::get(conn, name)? {
            Some(row) if row.is_top_level() => Ok(()),
            _ => Err(SessionStoreError::SessionNotFound(name.to_string())),
        }
    }

    fn assemble(conn: &Connection, row: SessionRow) -> Result<Session> {
        let bundle = OverlayRepo::bundle(conn, &row.name)?;
        let child = SessionRepo::get_child(conn, &row.name)?.map(child_from_row);
        Ok(session_from_parts(row, bundle, child))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row/domain conversion
// ─────────────────────────────────────────────────────────────────────────────

fn parse_state(raw: &str, name: &str) -> AgentState {
    match raw.parse() {
        Ok(state) => state,
        Err(_) => {
            warn!(session = name, state = raw, "unknown stored state, treating as idle");
            AgentState::Idle
        }
    }
}

fn session_from_parts(row: SessionRow, bundle: OverlayBundle, child: Option<ChildSession>) -> Session {
    let state = parse_state(&row.state, &row.name);
    Session {
        name: row.name,
        display_name: row.display_name,
        state,
        execution_id: row.execution_id,
        repo_path: row.repo_path,
        worktree_path: row.worktree_path,
        branch_name: row.branch_name,
        repo_info: row.repo_info,
        repo_source: row.repo_source,
        claude_dir: row.claude_dir,
        position: row.position,
        last_updated: row.last_updated,
        child,
        flagged: bundle.flagged_at.is_some(),
        flagged_at: bundle.flagged_at,
        status: bundle.status,
        comment: bundle.comment,
        archived: bundle.archived_at.is_some(),
        archived_at: bundle.archived_at,
        skip_permissions: bundle.skip_permissions,
    }
}

fn child_from_row(row: SessionRow) -> ChildSession {
    let state = parse_state(&row.state, &row.name);
    ChildSession {
        name: row.name,
        display_name: row.display_name,
        state,
        execution_id: row.execution_id,
        worktree_path: row.worktree_path,
        last_updated: row.last_updated,
    }
}

fn row_from_session(session: &Session, position: i64) -> SessionRow {
    SessionRow {
        name: session.name.clone(),
        display_name: session.display_name.clone(),
        state: session.state.as_str().to_string(),
        execution_id: session.execution_id.clone(),
        repo_path: session.repo_path.clone(),
        worktree_path: session.worktree_path.clone(),
        branch_name: session.branch_name.clone(),
        repo_info: session.repo_info.clone(),
        repo_source: session.repo_source.clone(),
        claude_dir: session.claude_dir.clone(),
        parent_name: None,
        position,
        last_updated: session.last_updated.clone(),
    }
}

fn row_from_child(child: &ChildSession, parent_name: &str) -> SessionRow {
    SessionRow {
        name: child.name.clone(),
        display_name: child.display_name.clone(),
        state: child.state.as_str().to_string(),
        execution_id: child.execution_id.clone(),
        repo_path: String::new(),
        worktree_path: child.worktree_path.clone(),
        branch_name: String::new(),
        repo_info: String::new(),
        repo_source: String::new(),
        claude_dir: String::new(),
        parent_name: Some(parent_name.to_string()),
        position: 0,
        last_updated: child.last_updated.clone(),
    }
}

fn bundle_from_session(session: &Session, now: &str) -> OverlayBundle {
    OverlayBundle {
        flagged_at: session
            .flagged
            .then(|| session.flagged_at.clone().unwrap_or_else(|| now.to_string())),
        status: session.status.clone().filter(|s| !s.is_empty()),
        comment: session.comment.clone().filter(|s| !s.is_empty()),
        archived_at: session
            .archived
            .then(|| session.archived_at.clone().unwrap_or_else(|| now.to_string())),
        skip_permissions: session.skip_permissions,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Busy/locked classification
// ─────────────────────────────────────────────────────────────────────────────

fn is_sqlite_busy_or_locked(err: &SessionStoreError) -> bool {
    match err {
        SessionStoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => matches!(
            code.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

fn finish_retry<T>(outcome: RetryOutcome<T, SessionStoreError>) -> Result<T> {
    match outcome.result {
        Ok(value) => Ok(value),
        Err(err) if is_sqlite_busy_or_locked(&err) => Err(busy_exhausted(err, outcome.attempts)),
        Err(err) => Err(err),
    }
}

fn busy_exhausted(err: SessionStoreError, attempts: u32) -> SessionStoreError {
    match err {
        SessionStoreError::Sqlite(source) => SessionStoreError::Unavailable { attempts, source },
        other => other,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
