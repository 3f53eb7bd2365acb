//! Hook event handling and execution/state reconciliation.
//!
//! Agent lifecycle hooks run as short-lived subprocesses that translate a
//! wire event name into an idempotent state assignment on the store. This
//! crate holds the event vocabulary ([`AgentEvent`]), the execution-id
//! resolution chain ([`execution::resolve`]), and the
//! [`StateReconciler`] the front end runs at startup to re-anchor stored
//! state to multiplexer reality.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod execution;
pub mod reconciler;

pub use errors::{HookError, Result};
pub use events::{AgentEvent, EventParseError};
pub use execution::{resolve_from_env, EXECUTION_ID_ENV};
pub use reconciler::StateReconciler;
