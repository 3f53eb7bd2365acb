//! Error types for migration between state roots.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from moving sessions between state roots.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Source or destination store operation failed.
    #[error(transparent)]
    Store(#[from] corral_store::SessionStoreError),

    /// VCS adapter call failed.
    #[error(transparent)]
    Git(#[from] corral_git::GitError),

    /// Filesystem move failed.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// No source sessions matched the selection.
    #[error("no sessions found for repository: {0}")]
    NoSessions(String),

    /// Selected sessions disagree on the shared checkout path.
    #[error("sessions for {repo_info} reference different checkouts: {first} vs {second}")]
    RepoMismatch {
        /// Repository identifier the selection was made with.
        repo_info: String,
        /// Checkout path of the first selected session.
        first: String,
        /// The conflicting checkout path.
        second: String,
    },

    /// Destination checkout exists and points at a different remote.
    #[error("checkout already exists at {path} with remote {existing}, expected {expected}")]
    RepoConflict {
        /// The occupied destination path.
        path: PathBuf,
        /// Remote of the checkout already at the destination.
        existing: String,
        /// Remote the migrating checkout points at.
        expected: String,
    },

    /// A copied session could not be read back from the destination.
    #[error("verification failed for session {name}: {source}")]
    VerificationFailed {
        /// Session that failed verification.
        name: String,
        /// The underlying destination-store error.
        #[source]
        source: corral_store::SessionStoreError,
    },
}

/// Convenience type alias for migration results.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sessions_display() {
        let err = MigrateError::NoSessions("owner/repo".into());
        assert_eq!(err.to_string(), "no sessions found for repository: owner/repo");
    }

    #[test]
    fn repo_mismatch_display_names_both_paths() {
        let err = MigrateError::RepoMismatch {
            repo_info: "owner/repo".into(),
            first: "/a/repo".into(),
            second: "/b/repo".into(),
        };
        assert!(err.to_string().contains("/a/repo vs /b/repo"));
    }

    #[test]
    fn repo_conflict_display_names_remotes() {
        let err = MigrateError::RepoConflict {
            path: PathBuf::from("/dst/repo"),
            existing: "example.com/other/repo".into(),
            expected: "example.com/owner/repo".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("example.com/other/repo"));
        assert!(rendered.contains("example.com/owner/repo"));
    }

    #[test]
    fn verification_failure_display_names_session() {
        let err = MigrateError::VerificationFailed {
            name: "alpha".into(),
            source: corral_store::SessionStoreError::SessionNotFound("alpha".into()),
        };
        assert!(err.to_string().contains("verification failed for session alpha"));
    }
}
