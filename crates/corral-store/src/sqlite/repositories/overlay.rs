//! Overlay repository for the per-session annotation tables.
//!
//! Overlays are sparse: a session has a flag, status, comment, archive
//! marker, or permissions marker only when a row exists in the matching
//! table. Clearing an overlay deletes the row rather than storing an
//! empty value.

use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::Result;

/// The full set of overlays for one session, absent entries as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayBundle {
    /// RFC 3339 timestamp when the session was flagged.
    pub flagged_at: Option<String>,
    /// Short status label.
    pub status: Option<String>,
    /// Free-form comment.
    pub comment: Option<String>,
    /// RFC 3339 timestamp when the session was archived.
    pub archived_at: Option<String>,
    /// Whether the agent runs with permission prompts skipped.
    pub skip_permissions: bool,
}

/// Repository for overlay table access.
///
/// All methods take `&Connection` so the caller controls transactions.
pub struct OverlayRepo;

impl OverlayRepo {
    /// Read every overlay for a session into one bundle.
    pub fn bundle(conn: &Connection, name: &str) -> Result<OverlayBundle> {
        let flagged_at = conn
            .query_row(
                "SELECT flagged_at FROM session_flags WHERE session_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let status = conn
            .query_row(
                "SELECT status FROM session_statuses WHERE session_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let comment = conn
            .query_row(
                "SELECT comment FROM session_comments WHERE session_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let archived_at = conn
            .query_row(
                "SELECT archived_at FROM session_archives WHERE session_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let skip_permissions: Option<i64> = conn
            .query_row(
                "SELECT skip_permissions FROM session_permissions WHERE session_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(OverlayBundle {
            flagged_at,
            status,
            comment,
            archived_at,
            skip_permissions: skip_permissions.is_some_and(|v| v != 0),
        })
    }

    /// Write all overlays for a session to match the bundle exactly.
    pub fn apply(conn: &Connection, name: &str, bundle: &OverlayBundle) -> Result<()> {
        match &bundle.flagged_at {
            Some(at) => Self::set_flag(conn, name, at)?,
            None => {
                let _ = Self::clear_flag(conn, name)?;
            }
        }
        match &bundle.status {
            Some(status) => Self::set_status(conn, name, status)?,
            None => {
                let _ = Self::clear_status(conn, name)?;
            }
        }
        match &bundle.comment {
            Some(comment) => Self::set_comment(conn, name, comment)?,
            None => {
                let _ = Self::clear_comment(conn, name)?;
            }
        }
        match &bundle.archived_at {
            Some(at) => Self::set_archive(conn, name, at)?,
            None => {
                let _ = Self::clear_archive(conn, name)?;
            }
        }
        if bundle.skip_permissions {
            Self::set_permission(conn, name)?;
        } else {
            let _ = Self::clear_permission(conn, name)?;
        }
        Ok(())
    }

    // ── flags ──

    /// Flag a session at the given timestamp.
    pub fn set_flag(conn: &Connection, name: &str, flagged_at: &str) -> Result<()> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO session_flags (session_name, flagged_at) VALUES (?1, ?2)",
            params![name, flagged_at],
        )?;
        Ok(())
    }

    /// Remove a session's flag. Returns `true` if one existed.
    pub fn clear_flag(conn: &Connection, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM session_flags WHERE session_name = ?1",
            params![name],
        )?;
        Ok(changed > 0)
    }

    /// Whether a session is flagged.
    pub fn has_flag(conn: &Connection, name: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM session_flags WHERE session_name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── status ──

    /// Set a session's status label.
    pub fn set_status(conn: &Connection, name: &str, status: &str) -> Result<()> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO session_statuses (session_name, status) VALUES (?1, ?2)",
            params![name, status],
        )?;
        Ok(())
    }

    /// Remove a session's status. Returns `true` if one existed.
    pub fn clear_status(conn: &Connection, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM session_statuses WHERE session_name = ?1",
            params![name],
        )?;
        Ok(changed > 0)
    }

    // ── comments ──

    /// Set a session's comment.
    pub fn set_comment(conn: &Connection, name: &str, comment: &str) -> Result<()> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO session_comments (session_name, comment) VALUES (?1, ?2)",
            params![name, comment],
        )?;
        Ok(())
    }

    /// Remove a session's comment. Returns `true` if one existed.
    pub fn clear_comment(conn: &Connection, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM session_comments WHERE session_name = ?1",
            params![name],
        )?;
        Ok(changed > 0)
    }

    // ── archives ──

    /// Archive a session at the given timestamp.
    pub fn set_archive(conn: &Connection, name: &str, archived_at: &str) -> Result<()> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO session_archives (session_name, archived_at) VALUES (?1, ?2)",
            params![name, archived_at],
        )?;
        Ok(())
    }

    /// Unarchive a session. Returns `true` if it was archived.
    pub fn clear_archive(conn: &Connection, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM session_archives WHERE session_name = ?1",
            params![name],
        )?;
        Ok(changed > 0)
    }

    /// Whether a session is archived.
    pub fn has_archive(conn: &Connection, name: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM session_archives WHERE session_name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── permissions ──

    /// Mark a session as skipping permission prompts.
    pub fn set_permission(conn: &Connection, name: &str) -> Result<()> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO session_permissions (session_name, skip_permissions) VALUES (?1, 1)",
            params![name],
        )?;
        Ok(())
    }

    /// Remove a session's permissions marker. Returns `true` if one existed.
    pub fn clear_permission(conn: &Connection, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM session_permissions WHERE session_name = ?1",
            params![name],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;
    use crate::sqlite::repositories::SessionRepo;
    use crate::sqlite::row_types::SessionRow;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        SessionRepo::insert(
            &conn,
            &SessionRow {
                name: "alpha".to_string(),
                display_name: "alpha".to_string(),
                state: "idle".to_string(),
                execution_id: "unknown".to_string(),
                repo_path: String::new(),
                worktree_path: String::new(),
                branch_name: String::new(),
                repo_info: String::new(),
                repo_source: String::new(),
                claude_dir: String::new(),
                parent_name: None,
                position: 0,
                last_updated: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
        conn
    }

    #[test]
    fn empty_bundle_for_unannotated_session() {
        let conn = setup();
        let bundle = OverlayRepo::bundle(&conn, "alpha").unwrap();
        assert_eq!(bundle, OverlayBundle::default());
        assert!(!bundle.skip_permissions);
    }

    #[test]
    fn flag_set_and_clear() {
        let conn = setup();
        OverlayRepo::set_flag(&conn, "alpha", "2026-01-02T00:00:00Z").unwrap();
        assert!(OverlayRepo::has_flag(&conn, "alpha").unwrap());

        let bundle = OverlayRepo::bundle(&conn, "alpha").unwrap();
        assert_eq!(bundle.flagged_at.as_deref(), Some("2026-01-02T00:00:00Z"));

        assert!(OverlayRepo::clear_flag(&conn, "alpha").unwrap());
        assert!(!OverlayRepo::has_flag(&conn, "alpha").unwrap());
        assert!(!OverlayRepo::clear_flag(&conn, "alpha").unwrap());
    }

    #[test]
    fn status_replaces_on_set() {
        let conn = setup();
        OverlayRepo::set_status(&conn, "alpha", "reviewing").unwrap();
        OverlayRepo::set_status(&conn, "alpha", "blocked").unwrap();

        let bundle = OverlayRepo::bundle(&conn, "alpha").unwrap();
        assert_eq!(bundle.status.as_deref(), Some("blocked"));
    }

    #[test]
    fn comment_set_and_clear() {
        let conn = setup();
        OverlayRepo::set_comment(&conn, "alpha", "needs rebase").unwrap();
        let bundle = OverlayRepo::bundle(&conn, "alpha").unwrap();
        assert_eq!(bundle.comment.as_deref(), Some("needs rebase"));

        assert!(OverlayRepo::clear_comment(&conn, "alpha").unwrap());
        assert!(OverlayRepo::bundle(&conn, "alpha").unwrap().comment.is_none());
    }

    #[test]
    fn archive_set_and_clear() {
        let conn = setup();
        OverlayRepo::set_archive(&conn, "alpha", "2026-01-05T00:00:00Z").unwrap();
        assert!(OverlayRepo::has_archive(&conn, "alpha").unwrap());

        assert!(OverlayRepo::clear_archive(&conn, "alpha").unwrap());
        assert!(!OverlayRepo::has_archive(&conn, "alpha").unwrap());
    }

    #[test]
    fn permission_marker_round_trips() {
        let conn = setup();
        OverlayRepo::set_permission(&conn, "alpha").unwrap();
        assert!(OverlayRepo::bundle(&conn, "alpha").unwrap().skip_permissions);

        assert!(OverlayRepo::clear_permission(&conn, "alpha").unwrap());
        assert!(!OverlayRepo::bundle(&conn, "alpha").unwrap().skip_permissions);
    }

    #[test]
    fn apply_syncs_all_tables() {
        let conn = setup();
        OverlayRepo::set_status(&conn, "alpha", "stale").unwrap();

        let bundle = OverlayBundle {
            flagged_at: Some("2026-01-02T00:00:00Z".to_string()),
            status: None,
            comment: Some("wip".to_string()),
            archived_at: None,
            skip_permissions: true,
        };
        OverlayRepo::apply(&conn, "alpha", &bundle).unwrap();

        let read = OverlayRepo::bundle(&conn, "alpha").unwrap();
        assert_eq!(read, bundle);
    }

    #[test]
    fn overlay_for_missing_session_fails_fk() {
        let conn = setup();
        assert!(OverlayRepo::set_flag(&conn, "ghost", "2026-01-02T00:00:00Z").is_err());
    }
}
