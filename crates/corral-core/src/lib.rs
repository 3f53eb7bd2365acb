//! # corral-core
//!
//! Foundation types shared by every corral crate:
//!
//! - **Sessions**: [`Session`] / [`ChildSession`] — the two-level session
//!   shape, plus [`SessionSnapshot`] as the load/save unit
//! - **States**: [`AgentState`] — the four-state agent lifecycle
//! - **Branded IDs**: [`ExecutionId`] — opaque front-end run correlation token
//! - **Retry**: [`retry::RetryPolicy`] and the pure higher-order retry runner

#![deny(unsafe_code)]

pub mod ids;
pub mod retry;
pub mod session;
pub mod state;

pub use ids::ExecutionId;
pub use session::{ChildSession, Session, SessionSnapshot};
pub use state::{AgentState, StateParseError};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
