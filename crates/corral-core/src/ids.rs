//! Execution ID newtype.
//!
//! An [`ExecutionId`] correlates one run of the long-lived front end with the
//! sessions it supervises. It is an opaque string — freshly generated ids are
//! UUID v7 (time-ordered), but hook subprocesses may carry any value they
//! inherited, including the [`ExecutionId::unknown`] sentinel when they run
//! detached from their originating front end.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sentinel value for events whose originating front end cannot be resolved.
pub const UNKNOWN_EXECUTION_ID: &str = "unknown";

/// Opaque correlation token identifying one front-end run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Create a fresh ID (UUID v7, time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The sentinel ID used when no real id can be resolved.
    #[must_use]
    pub fn unknown() -> Self {
        Self(UNKNOWN_EXECUTION_ID.to_string())
    }

    /// Create from an existing string value.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether this is the sentinel value.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_EXECUTION_ID
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for ExecutionId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ExecutionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ExecutionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<ExecutionId> for String {
    fn from(id: ExecutionId) -> Self {
        id.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = ExecutionId::new();
        let b = ExecutionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn new_ids_are_valid_uuids() {
        let id = ExecutionId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn unknown_sentinel() {
        let id = ExecutionId::unknown();
        assert!(id.is_unknown());
        assert_eq!(id.as_str(), "unknown");
        assert!(!ExecutionId::new().is_unknown());
    }

    #[test]
    fn from_str_and_display() {
        let id = ExecutionId::from("run-42");
        assert_eq!(id.to_string(), "run-42");
        assert_eq!(&*id, "run-42");
    }

    #[test]
    fn serde_is_transparent() {
        let id = ExecutionId::from("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
        let back: ExecutionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn into_inner_returns_string() {
        let id = ExecutionId::from_string("xyz".to_string());
        assert_eq!(id.into_inner(), "xyz");
    }
}
