//! Session repository for rows in the `sessions` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::Result;
use crate::sqlite::row_types::SessionRow;

/// Repository for session row CRUD.
///
/// All methods take `&Connection` so the caller controls transactions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session row. Fails if the name already exists.
    pub fn insert(conn: &Connection, row: &SessionRow) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO sessions (
               name, display_name, state, execution_id,
               repo_path, worktree_path, branch_name, repo_info, repo_source, claude_dir,
               parent_name, position, last_updated
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                row.name,
                row.display_name,
                row.state,
                row.execution_id,
                row.repo_path,
                row.worktree_path,
                row.branch_name,
                row.repo_info,
                row.repo_source,
                row.claude_dir,
                row.parent_name,
                row.position,
                row.last_updated,
            ],
        )?;
        Ok(())
    }

    /// Insert or fully replace a session row keyed by name.
    pub fn upsert(conn: &Connection, row: &SessionRow) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO sessions (
               name, display_name, state, execution_id,
               repo_path, worktree_path, branch_name, repo_info, repo_source, claude_dir,
               parent_name, position, last_updated
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(name) DO UPDATE SET
               display_name = excluded.display_name,
               state = excluded.state,
               execution_id = excluded.execution_id,
               repo_path = excluded.repo_path,
               worktree_path = excluded.worktree_path,
               branch_name = excluded.branch_name,
               repo_info = excluded.repo_info,
               repo_source = excluded.repo_source,
               claude_dir = excluded.claude_dir,
               parent_name = excluded.parent_name,
               position = excluded.position,
               last_updated = excluded.last_updated",
            params![
                row.name,
                row.display_name,
                row.state,
                row.execution_id,
                row.repo_path,
                row.worktree_path,
                row.branch_name,
                row.repo_info,
                row.repo_source,
                row.claude_dir,
                row.parent_name,
                row.position,
                row.last_updated,
            ],
        )?;
        Ok(())
    }

    /// Fetch a session row by name, top-level or child.
    pub fn get(conn: &Connection, name: &str) -> Result<Option<SessionRow>> {
        let row = conn
            .query_row(
                "SELECT * FROM sessions WHERE name = ?1",
                params![name],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Fetch the child shell row for a parent session, if any.
    pub fn get_child(conn: &Connection, parent_name: &str) -> Result<Option<SessionRow>> {
        let row = conn
            .query_row(
                "SELECT * FROM sessions WHERE parent_name = ?1",
                params![parent_name],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List all top-level sessions ordered by position, ties broken by name.
    pub fn list_top_level(conn: &Connection) -> Result<Vec<SessionRow>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM sessions WHERE parent_name IS NULL ORDER BY position, name",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// List every session name in the table, top-level and child.
    pub fn all_names(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT name FROM sessions ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Delete a session row. Children and overlay rows cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub fn delete(conn: &Connection, name: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM sessions WHERE name = ?1", params![name])?;
        Ok(changed > 0)
    }

    /// Delete every session row whose name is not in `keep`.
    ///
    /// Children of deleted parents cascade even when listed in `keep`.
    /// Returns the number of rows deleted directly.
    pub fn delete_all_except(conn: &Connection, keep: &[&str]) -> Result<usize> {
        if keep.is_empty() {
            let changed = conn.execute("DELETE FROM sessions", [])?;
            return Ok(changed);
        }
        let placeholders = keep.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("DELETE FROM sessions WHERE name NOT IN ({placeholders})");
        let changed = conn.execute(&sql, rusqlite::params_from_iter(keep.iter()))?;
        Ok(changed)
    }

    /// Rename a session, updating its display name and timestamp.
    ///
    /// Child rows and overlay rows follow via `ON UPDATE CASCADE`.
    /// Returns `true` if a row was renamed.
    pub fn rename(
        conn: &Connection,
        old_name: &str,
        new_name: &str,
        display_name: &str,
        now: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET name = ?2, display_name = ?3, last_updated = ?4 WHERE name = ?1",
            params![old_name, new_name, display_name, now],
        )?;
        Ok(changed > 0)
    }

    /// Update a session's agent state and the execution id that set it.
    ///
    /// Returns `true` if a row was updated.
    pub fn update_state(
        conn: &Connection,
        name: &str,
        state: &str,
        execution_id: &str,
        now: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET state = ?2, execution_id = ?3, last_updated = ?4 WHERE name = ?1",
            params![name, state, execution_id, now],
        )?;
        Ok(changed > 0)
    }

    /// Stamp a session with an execution id without touching `last_updated`.
    ///
    /// Returns `true` if a row was updated.
    pub fn update_execution_id(conn: &Connection, name: &str, execution_id: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET execution_id = ?2 WHERE name = ?1",
            params![name, execution_id],
        )?;
        Ok(changed > 0)
    }

    /// Update a session's normalized remote URL.
    pub fn update_repo_source(
        conn: &Connection,
        name: &str,
        repo_source: &str,
        now: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET repo_source = ?2, last_updated = ?3 WHERE name = ?1",
            params![name, repo_source, now],
        )?;
        Ok(changed > 0)
    }

    /// Update a session's agent config directory.
    pub fn update_claude_dir(
        conn: &Connection,
        name: &str,
        claude_dir: &str,
        now: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET claude_dir = ?2, last_updated = ?3 WHERE name = ?1",
            params![name, claude_dir, now],
        )?;
        Ok(changed > 0)
    }

    /// Set a session's ordering position.
    pub fn set_position(conn: &Connection, name: &str, position: i64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET position = ?2 WHERE name = ?1",
            params![name, position],
        )?;
        Ok(changed > 0)
    }

    /// Read a session's ordering position.
    pub fn position_of(conn: &Connection, name: &str) -> Result<Option<i64>> {
        let position = conn
            .query_row(
                "SELECT position FROM sessions WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(position)
    }

    /// Minimum position across top-level sessions, `None` when empty.
    pub fn min_position(conn: &Connection) -> Result<Option<i64>> {
        let min = conn.query_row(
            "SELECT MIN(position) FROM sessions WHERE parent_name IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(min)
    }

    /// Maximum position across top-level sessions, `None` when empty.
    pub fn max_position(conn: &Connection) -> Result<Option<i64>> {
        let max = conn.query_row(
            "SELECT MAX(position) FROM sessions WHERE parent_name IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// Whether a session row with this name exists.
    pub fn exists(conn: &Connection, name: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn map_row(row: &Row) -> rusqlite::Result<SessionRow> {
        Ok(SessionRow {
            name: row.get("name")?,
            display_name: row.get("display_name")?,
            state: row.get("state")?,
            execution_id: row.get("execution_id")?,
            repo_path: row.get("repo_path")?,
            worktree_path: row.get("worktree_path")?,
            branch_name: row.get("branch_name")?,
            repo_info: row.get("repo_info")?,
            repo_source: row.get("repo_source")?,
            claude_dir: row.get("claude_dir")?,
            parent_name: row.get("parent_name")?,
            position: row.get("position")?,
            last_updated: row.get("last_updated")?,
        })
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn row(name: &str, position: i64) -> SessionRow {
        SessionRow {
            name: name.to_string(),
            display_name: name.to_string(),
            state: "idle".to_string(),
            execution_id: "unknown".to_string(),
            repo_path: String::new(),
            worktree_path: String::new(),
            branch_name: String::new(),
            repo_info: String::new(),
            repo_source: String::new(),
            claude_dir: String::new(),
            parent_name: None,
            position,
            last_updated: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn child_row(name: &str, parent: &str) -> SessionRow {
        let mut r = row(name, 0);
        r.parent_name = Some(parent.to_string());
        r
    }

    // ── insert / get ──

    #[test]
    fn insert_and_get_round_trip() {
        let conn = setup();
        let r = row("alpha", 3);
        SessionRepo::insert(&conn, &r).unwrap();

        let fetched = SessionRepo::get(&conn, "alpha").unwrap().unwrap();
        assert_eq!(fetched, r);
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = setup();
        assert!(SessionRepo::get(&conn, "ghost").unwrap().is_none());
    }

    #[test]
    fn insert_duplicate_name_fails() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        assert!(SessionRepo::insert(&conn, &row("alpha", 1)).is_err());
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();

        let mut updated = row("alpha", 5);
        updated.state = "working".to_string();
        SessionRepo::upsert(&conn, &updated).unwrap();

        let fetched = SessionRepo::get(&conn, "alpha").unwrap().unwrap();
        assert_eq!(fetched.position, 5);
        assert_eq!(fetched.state, "working");
    }

    // ── listing and ordering ──

    #[test]
    fn list_top_level_orders_by_position_then_name() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("charlie", 1)).unwrap();
        SessionRepo::insert(&conn, &row("alpha", 2)).unwrap();
        SessionRepo::insert(&conn, &row("bravo", 1)).unwrap();

        let names: Vec<String> = SessionRepo::list_top_level(&conn)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["bravo", "charlie", "alpha"]);
    }

    #[test]
    fn list_top_level_excludes_children() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        SessionRepo::insert(&conn, &child_row("alpha-shell", "alpha")).unwrap();

        let rows = SessionRepo::list_top_level(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "alpha");
    }

    #[test]
    fn get_child_finds_shell_row() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        SessionRepo::insert(&conn, &child_row("alpha-shell", "alpha")).unwrap();

        let child = SessionRepo::get_child(&conn, "alpha").unwrap().unwrap();
        assert_eq!(child.name, "alpha-shell");
        assert!(SessionRepo::get_child(&conn, "bravo").unwrap().is_none());
    }

    #[test]
    fn all_names_includes_children() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        SessionRepo::insert(&conn, &child_row("alpha-shell", "alpha")).unwrap();

        let names = SessionRepo::all_names(&conn).unwrap();
        assert_eq!(names, vec!["alpha", "alpha-shell"]);
    }

    // ── delete ──

    #[test]
    fn delete_returns_whether_row_existed() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        assert!(SessionRepo::delete(&conn, "alpha").unwrap());
        assert!(!SessionRepo::delete(&conn, "alpha").unwrap());
    }

    #[test]
    fn delete_parent_cascades_to_child() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        SessionRepo::insert(&conn, &child_row("alpha-shell", "alpha")).unwrap();

        SessionRepo::delete(&conn, "alpha").unwrap();
        assert!(SessionRepo::get(&conn, "alpha-shell").unwrap().is_none());
    }

    #[test]
    fn delete_all_except_keeps_named_rows() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        SessionRepo::insert(&conn, &row("bravo", 1)).unwrap();
        SessionRepo::insert(&conn, &row("charlie", 2)).unwrap();

        let deleted = SessionRepo::delete_all_except(&conn, &["alpha", "charlie"]).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(SessionRepo::all_names(&conn).unwrap(), vec!["alpha", "charlie"]);
    }

    #[test]
    fn delete_all_except_empty_clears_table() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        SessionRepo::insert(&conn, &row("bravo", 1)).unwrap();

        let deleted = SessionRepo::delete_all_except(&conn, &[]).unwrap();
        assert_eq!(deleted, 2);
        assert!(SessionRepo::all_names(&conn).unwrap().is_empty());
    }

    // ── rename ──

    #[test]
    fn rename_updates_name_and_display() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();

        let renamed =
            SessionRepo::rename(&conn, "alpha", "bravo", "bravo", "2026-01-02T00:00:00Z").unwrap();
        assert!(renamed);

        let fetched = SessionRepo::get(&conn, "bravo").unwrap().unwrap();
        assert_eq!(fetched.display_name, "bravo");
        assert_eq!(fetched.last_updated, "2026-01-02T00:00:00Z");
        assert!(SessionRepo::get(&conn, "alpha").unwrap().is_none());
    }

    #[test]
    fn rename_carries_child_parent_pointer() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        SessionRepo::insert(&conn, &child_row("alpha-shell", "alpha")).unwrap();

        SessionRepo::rename(&conn, "alpha", "bravo", "bravo", "2026-01-02T00:00:00Z").unwrap();

        let child = SessionRepo::get_child(&conn, "bravo").unwrap().unwrap();
        assert_eq!(child.name, "alpha-shell");
    }

    #[test]
    fn rename_missing_returns_false() {
        let conn = setup();
        assert!(
            !SessionRepo::rename(&conn, "ghost", "bravo", "bravo", "2026-01-02T00:00:00Z")
                .unwrap()
        );
    }

    // ── column updates ──

    #[test]
    fn update_state_stamps_execution_and_timestamp() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();

        let updated =
            SessionRepo::update_state(&conn, "alpha", "working", "exec-1", "2026-01-02T00:00:00Z")
                .unwrap();
        assert!(updated);

        let fetched = SessionRepo::get(&conn, "alpha").unwrap().unwrap();
        assert_eq!(fetched.state, "working");
        assert_eq!(fetched.execution_id, "exec-1");
        assert_eq!(fetched.last_updated, "2026-01-02T00:00:00Z");
    }

    #[test]
    fn update_execution_id_preserves_timestamp() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();

        SessionRepo::update_execution_id(&conn, "alpha", "exec-2").unwrap();

        let fetched = SessionRepo::get(&conn, "alpha").unwrap().unwrap();
        assert_eq!(fetched.execution_id, "exec-2");
        assert_eq!(fetched.last_updated, "2026-01-01T00:00:00Z");
    }

    #[test]
    fn update_repo_source_and_claude_dir() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();

        SessionRepo::update_repo_source(
            &conn,
            "alpha",
            "example.com/org/repo",
            "2026-01-02T00:00:00Z",
        )
        .unwrap();
        SessionRepo::update_claude_dir(&conn, "alpha", "/tmp/claude", "2026-01-03T00:00:00Z")
            .unwrap();

        let fetched = SessionRepo::get(&conn, "alpha").unwrap().unwrap();
        assert_eq!(fetched.repo_source, "example.com/org/repo");
        assert_eq!(fetched.claude_dir, "/tmp/claude");
        assert_eq!(fetched.last_updated, "2026-01-03T00:00:00Z");
    }

    // ── positions ──

    #[test]
    fn position_helpers_cover_top_level_rows() {
        let conn = setup();
        assert!(SessionRepo::min_position(&conn).unwrap().is_none());
        assert!(SessionRepo::max_position(&conn).unwrap().is_none());

        SessionRepo::insert(&conn, &row("alpha", 2)).unwrap();
        SessionRepo::insert(&conn, &row("bravo", -1)).unwrap();
        SessionRepo::insert(&conn, &child_row("alpha-shell", "alpha")).unwrap();

        assert_eq!(SessionRepo::min_position(&conn).unwrap(), Some(-1));
        assert_eq!(SessionRepo::max_position(&conn).unwrap(), Some(2));
        assert_eq!(SessionRepo::position_of(&conn, "alpha").unwrap(), Some(2));
        assert!(SessionRepo::position_of(&conn, "ghost").unwrap().is_none());
    }

    #[test]
    fn set_position_moves_row() {
        let conn = setup();
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();

        SessionRepo::set_position(&conn, "alpha", 7).unwrap();
        assert_eq!(SessionRepo::position_of(&conn, "alpha").unwrap(), Some(7));
    }

    #[test]
    fn exists_reports_presence() {
        let conn = setup();
        assert!(!SessionRepo::exists(&conn, "alpha").unwrap());
        SessionRepo::insert(&conn, &row("alpha", 0)).unwrap();
        assert!(SessionRepo::exists(&conn, "alpha").unwrap());
    }
}
