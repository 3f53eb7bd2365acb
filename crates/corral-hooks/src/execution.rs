//! Execution-id resolution for hook callbacks.
//!
//! Hook subprocesses may run detached from the front end that spawned their
//! session, so the id to stamp on an event is resolved through a graceful
//! degradation chain rather than assumed present.

use corral_core::ExecutionId;

/// Environment variable carrying the front end's execution id.
///
/// The front end injects this into every multiplexer session it spawns, so
/// hook subprocesses started inside those sessions inherit it.
pub const EXECUTION_ID_ENV: &str = "CORRAL_EXECUTION_ID";

/// Resolve the execution id to stamp on a hook event.
///
/// Precedence: explicit flag, then the inherited environment variable, then
/// the id already stored on the session, then the unknown sentinel. Empty
/// strings count as absent at every layer.
#[must_use]
pub fn resolve(flag: Option<&str>, env: Option<&str>, stored: Option<&str>) -> ExecutionId {
    present(flag)
        .or_else(|| present(env))
        .or_else(|| present(stored))
        .map_or_else(ExecutionId::unknown, ExecutionId::from_string)
}

/// [`resolve`] with the environment layer read from this process.
#[must_use]
pub fn resolve_from_env(flag: Option<&str>, stored: Option<&str>) -> ExecutionId {
    let env = std::env::var(EXECUTION_ID_ENV).ok();
    resolve(flag, env.as_deref(), stored)
}

fn present(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(ToString::to_string)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_everything() {
        let id = resolve(Some("exec-flag"), Some("exec-env"), Some("exec-stored"));
        assert_eq!(id.as_str(), "exec-flag");
    }

    #[test]
    fn env_wins_over_stored() {
        let id = resolve(None, Some("exec-env"), Some("exec-stored"));
        assert_eq!(id.as_str(), "exec-env");
    }

    #[test]
    fn stored_wins_over_sentinel() {
        let id = resolve(None, None, Some("exec-stored"));
        assert_eq!(id.as_str(), "exec-stored");
    }

    #[test]
    fn falls_back_to_unknown() {
        let id = resolve(None, None, None);
        assert!(id.is_unknown());
    }

    #[test]
    fn empty_layers_are_skipped() {
        let id = resolve(Some(""), Some(""), Some("exec-stored"));
        assert_eq!(id.as_str(), "exec-stored");

        assert!(resolve(Some(""), None, Some("")).is_unknown());
    }
}
