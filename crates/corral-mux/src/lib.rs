//! Terminal multiplexer adapter.
//!
//! Sessions live in tmux; this crate wraps the handful of tmux operations
//! the rest of the system needs behind the [`Multiplexer`] trait, with a
//! production implementation that shells out to the tmux binary and an
//! in-memory fake for tests.

#![deny(unsafe_code)]

pub mod errors;
pub mod fake;
pub mod tmux;
pub mod traits;

pub use errors::{MuxError, Result};
pub use fake::{FakeMultiplexer, FakeSession};
pub use tmux::TmuxMultiplexer;
pub use traits::Multiplexer;
