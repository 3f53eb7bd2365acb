//! Hook event vocabulary.
//!
//! Agent lifecycle hooks fire as short-lived subprocesses carrying one of a
//! small set of wire event names. Each event maps to a target
//! [`AgentState`]; applying one is an idempotent assignment, never a delta.

use corral_core::AgentState;
use thiserror::Error;

/// An agent lifecycle event delivered by a hook callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentEvent {
    /// Agent finished processing and is back to waiting for work.
    Finished,
    /// Agent is blocked on user input.
    NeedsInput,
    /// Agent started up inside the session.
    Initialized,
    /// A prompt was submitted to the agent.
    Submitted,
    /// Agent process terminated.
    Exited,
}

impl AgentEvent {
    /// Wire name of this event, as hooks deliver it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::NeedsInput => "needs-input",
            Self::Initialized => "initialized",
            Self::Submitted => "submitted",
            Self::Exited => "exited",
        }
    }

    /// The state this event assigns to the session.
    #[must_use]
    pub fn target_state(self) -> AgentState {
        match self {
            Self::Finished | Self::Initialized => AgentState::Idle,
            Self::NeedsInput => AgentState::Waiting,
            Self::Submitted => AgentState::Working,
            Self::Exited => AgentState::Exited,
        }
    }

    /// All events, for exhaustive iteration in tests and help text.
    #[must_use]
    pub fn all() -> &'static [AgentEvent] {
        &[
            Self::Finished,
            Self::NeedsInput,
            Self::Initialized,
            Self::Submitted,
            Self::Exited,
        ]
    }
}

impl std::fmt::Display for AgentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized wire event name.
///
/// Callers log the event and skip the state update rather than failing the
/// whole hook invocation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown hook event: {0}")]
pub struct EventParseError(pub String);

impl std::str::FromStr for AgentEvent {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished" => Ok(Self::Finished),
            "needs-input" => Ok(Self::NeedsInput),
            "initialized" => Ok(Self::Initialized),
            "submitted" => Ok(Self::Submitted),
            "exited" => Ok(Self::Exited),
            other => Err(EventParseError(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
