//! Error types for multiplexer operations.

use thiserror::Error;

/// Errors from the multiplexer adapter.
#[derive(Debug, Error)]
pub enum MuxError {
    /// The multiplexer binary could not be spawned.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The full command line that failed to start.
        command: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The multiplexer command exited non-zero.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The full command line that failed.
        command: String,
        /// Trimmed stderr from the command.
        stderr: String,
    },

    /// No session with the given name.
    #[error("no such session: {0}")]
    SessionNotFound(String),
}

/// Convenience result type for multiplexer operations.
pub type Result<T> = std::result::Result<T, MuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display_includes_stderr() {
        let err = MuxError::CommandFailed {
            command: "tmux kill-session -t alpha".to_string(),
            stderr: "can't find session: alpha".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tmux kill-session"));
        assert!(msg.contains("can't find session"));
    }

    #[test]
    fn spawn_error_chains_source() {
        let err = MuxError::Spawn {
            command: "tmux list-sessions".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no tmux"),
        };
        assert!(err.to_string().contains("failed to run"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn session_not_found_display() {
        let err = MuxError::SessionNotFound("alpha".to_string());
        assert_eq!(err.to_string(), "no such session: alpha");
    }
}
