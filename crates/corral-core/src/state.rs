//! Agent lifecycle state.
//!
//! A session's agent is always in exactly one of four states. States are
//! idempotent assignments — hook events set a state outright rather than
//! applying deltas, so replaying an event is harmless.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of the agent running inside a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    /// Agent is alive and waiting for work.
    #[default]
    Idle,
    /// Agent is actively processing a submitted prompt.
    Working,
    /// Agent is blocked on user input.
    Waiting,
    /// Agent process is gone.
    Exited,
}

impl AgentState {
    /// Stable string form, used as the database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Waiting => "waiting",
            Self::Exited => "exited",
        }
    }

    /// All states, in lifecycle order.
    #[must_use]
    pub fn all() -> &'static [AgentState] {
        &[Self::Idle, Self::Working, Self::Waiting, Self::Exited]
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown state string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown agent state: {0}")]
pub struct StateParseError(pub String);

impl std::str::FromStr for AgentState {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "working" => Ok(Self::Working),
            "waiting" => Ok(Self::Waiting),
            "exited" => Ok(Self::Exited),
            other => Err(StateParseError(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(AgentState::default(), AgentState::Idle);
    }

    #[test]
    fn display_matches_as_str() {
        for state in AgentState::all() {
            assert_eq!(state.to_string(), state.as_str());
        }
    }

    #[test]
    fn round_trips_through_str() {
        for state in AgentState::all() {
            let parsed: AgentState = state.as_str().parse().unwrap();
            assert_eq!(parsed, *state);
        }
    }

    #[test]
    fn unknown_state_is_an_error() {
        let err = "paused".parse::<AgentState>().unwrap_err();
        assert_eq!(err, StateParseError("paused".into()));
        assert_eq!(err.to_string(), "unknown agent state: paused");
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&AgentState::Waiting).unwrap(),
            "\"waiting\""
        );
        let back: AgentState = serde_json::from_str("\"exited\"").unwrap();
        assert_eq!(back, AgentState::Exited);
    }

    #[test]
    fn all_lists_four_states() {
        assert_eq!(AgentState::all().len(), 4);
    }
}
