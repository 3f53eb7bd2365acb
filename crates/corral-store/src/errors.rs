//! Error types for the session store subsystem.
//!
//! [`SessionStoreError`] is the primary error type returned by all store
//! operations. It provides specific variants for common failure modes while
//! keeping the surface area small enough for exhaustive pattern matching.

use thiserror::Error;

/// Errors that can occur during session store operations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Failed to create or access the state-root directory.
    #[error("state directory error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Requested session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The database stayed busy or locked through the whole retry budget.
    #[error("store unavailable after {attempts} attempts: {source}")]
    Unavailable {
        /// Total attempts made, including the initial one.
        attempts: u32,
        /// The busy/locked error from the final attempt.
        #[source]
        source: rusqlite::Error,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for session store results.
pub type Result<T> = std::result::Result<T, SessionStoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
