//! Git operations for session checkouts and worktrees.
//!
//! The [`Vcs`] trait covers the handful of git operations the rest of the
//! workspace needs. [`GitCli`] shells out to the `git` binary; [`FakeVcs`]
//! is an in-memory recording double for tests. [`remote`] holds the pure
//! remote-URL normalization used to decide whether two checkouts point at
//! the same upstream.

#![deny(unsafe_code)]

pub mod cli;
pub mod errors;
pub mod fake;
pub mod remote;
pub mod traits;

pub use cli::GitCli;
pub use errors::{GitError, Result};
pub use fake::FakeVcs;
pub use remote::{normalize_remote_url, same_remote};
pub use traits::Vcs;
