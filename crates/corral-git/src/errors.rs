//! Error types for VCS operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the VCS adapter.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be spawned.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The full command line that failed to start.
        command: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The git command exited non-zero.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The full command line that failed.
        command: String,
        /// Trimmed stderr from the command.
        stderr: String,
    },

    /// The path is not a git working copy.
    #[error("not a git repository: {0}")]
    NotARepo(PathBuf),

    /// Filesystem preparation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result type for VCS operations.
pub type Result<T> = std::result::Result<T, GitError>;
