//! Schema migration runner for the session database.
//!
//! Migrations are embedded at compile time via [`include_str!`] and executed
//! in version order. Each migration runs inside a transaction — a failure
//! rolls back cleanly with no partial schema state.
//!
//! The `schema_version` table tracks which migrations have been applied.
//! Running the migrator is idempotent: already-applied versions are skipped.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::{Result, SessionStoreError};

/// A single migration with a version number and SQL to execute.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in version order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Complete schema — sessions, overlay tables, indexes",
    sql: include_str!("v001_schema.sql"),
}];

/// Run all pending migrations on the given connection.
///
/// Creates the `schema_version` table if it doesn't exist, then applies
/// each migration whose version exceeds the current maximum. Each migration
/// runs in its own transaction.
///
/// # Errors
///
/// Returns [`SessionStoreError::Migration`] if any migration SQL fails.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    ensure_version_table(conn)?;
    let current = current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version <= current {
            debug!(
                version = migration.version,
                description = migration.description,
                "migration already applied, skipping"
            );
            continue;
        }

        info!(
            version = migration.version,
            description = migration.description,
            "applying migration"
        );

        apply_migration(conn, migration)?;
        applied += 1;
    }

    if applied > 0 {
        info!(applied, "migrations complete");
    }

    Ok(applied)
}

/// Return the highest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| SessionStoreError::Migration {
            message: format!("failed to read schema_version: {e}"),
        })?;
    Ok(version)
}

/// Return the latest migration version defined in code.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal
// ─────────────────────────────────────────────────────────────────────────────

fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
           version     INTEGER PRIMARY KEY,
           applied_at  TEXT    NOT NULL,
           description TEXT
         );",
    )
    .map_err(|e| SessionStoreError::Migration {
        message: format!("failed to create schema_version table: {e}"),
    })?;
    Ok(())
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| SessionStoreError::Migration {
            message: format!(
                "failed to begin transaction for v{}: {e}",
                migration.version
            ),
        })?;

    tx.execute_batch(migration.sql)
        .map_err(|e| SessionStoreError::Migration {
            message: format!(
                "migration v{} ({}) failed: {e}",
                migration.version, migration.description
            ),
        })?;

    let _ = tx.execute(
        "INSERT INTO schema_version (version, applied_at, description) VALUES (?1, datetime('now'), ?2)",
        rusqlite::params![migration.version, migration.description],
    )
    .map_err(|e| SessionStoreError::Migration {
        message: format!("failed to record v{} in schema_version: {e}", migration.version),
    })?;

    tx.commit().map_err(|e| SessionStoreError::Migration {
        message: format!("failed to commit v{}: {e}", migration.version),
    })?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn open_memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;",
        )
        .unwrap();
        conn
    }

    #[test]
    fn run_migrations_creates_all_tables() {
        let conn = open_memory();
        let applied = run_migrations(&conn).unwrap();
        assert_eq!(applied, 1);

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        let expected = [
            "schema_version",
            "session_archives",
            "session_comments",
            "session_flags",
            "session_permissions",
            "session_statuses",
            "sessions",
        ];
        for table in &expected {
            assert!(
                tables.contains(&(*table).to_string()),
                "missing table: {table}"
            );
        }
    }

    #[test]
    fn run_migrations_is_idempotent() {
        let conn = open_memory();
        let first = run_migrations(&conn).unwrap();
        assert_eq!(first, 1);

        let second = run_migrations(&conn).unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn current_version_starts_at_zero() {
        let conn = open_memory();
        ensure_version_table(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn current_version_after_migration() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 1);
    }

    #[test]
    fn latest_version_matches_migrations() {
        assert_eq!(latest_version(), 1);
    }

    #[test]
    fn schema_version_records_applied_migration() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        let (version, desc): (u32, String) = conn
            .query_row(
                "SELECT version, description FROM schema_version WHERE version = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();

        assert_eq!(version, 1);
        assert!(desc.contains("Complete schema"));
    }

    #[test]
    fn indexes_are_created() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.contains(&"idx_sessions_parent".to_string()));
        assert!(indexes.contains(&"idx_sessions_position".to_string()));
    }

    #[test]
    fn sessions_table_has_expected_columns() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(sessions)")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        let expected = [
            "name",
            "display_name",
            "state",
            "execution_id",
            "repo_path",
            "worktree_path",
            "branch_name",
            "repo_info",
            "repo_source",
            "claude_dir",
            "parent_name",
            "position",
            "last_updated",
        ];
        for col in &expected {
            assert!(
                columns.contains(&(*col).to_string()),
                "sessions table missing column: {col}"
            );
        }
    }

    #[test]
    fn foreign_keys_enforced() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        // Overlay row for a missing session should fail
        let result = conn.execute(
            "INSERT INTO session_flags (session_name, flagged_at) VALUES ('ghost', datetime('now'))",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn parent_delete_cascades_to_child_and_overlays() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO sessions (name, display_name, last_updated) VALUES ('alpha', 'Alpha', datetime('now'));
             INSERT INTO sessions (name, display_name, parent_name, last_updated) VALUES ('alpha-shell', 'Shell', 'alpha', datetime('now'));
             INSERT INTO session_flags (session_name, flagged_at) VALUES ('alpha', datetime('now'));
             INSERT INTO session_comments (session_name, comment) VALUES ('alpha', 'wip');",
        )
        .unwrap();

        conn.execute("DELETE FROM sessions WHERE name = 'alpha'", [])
            .unwrap();

        let sessions: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        let flags: i64 = conn
            .query_row("SELECT COUNT(*) FROM session_flags", [], |row| row.get(0))
            .unwrap();
        let comments: i64 = conn
            .query_row("SELECT COUNT(*) FROM session_comments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sessions, 0);
        assert_eq!(flags, 0);
        assert_eq!(comments, 0);
    }

    #[test]
    fn rename_cascades_to_child_and_overlays() {
        let conn = open_memory();
        run_migrations(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO sessions (name, display_name, last_updated) VALUES ('alpha', 'Alpha', datetime('now'));
             INSERT INTO sessions (name, display_name, parent_name, last_updated) VALUES ('alpha-shell', 'Shell', 'alpha', datetime('now'));
             INSERT INTO session_statuses (session_name, status) VALUES ('alpha', 'reviewing');",
        )
        .unwrap();

        conn.execute("UPDATE sessions SET name = 'bravo' WHERE name = 'alpha'", [])
            .unwrap();

        let parent: String = conn
            .query_row(
                "SELECT parent_name FROM sessions WHERE name = 'alpha-shell'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        let status_owner: String = conn
            .query_row(
                "SELECT session_name FROM session_statuses WHERE status = 'reviewing'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(parent, "bravo");
        assert_eq!(status_owner, "bravo");
    }
}
