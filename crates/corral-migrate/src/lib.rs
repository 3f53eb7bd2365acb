//! Migration of sessions between state-root directories.
//!
//! [`MigrationEngine`] moves a coherent set of sessions, their shared
//! repository checkout, and their individual working trees from one state
//! root to another. Record moves go through the two stores' public
//! operations; directory moves prefer an atomic rename and fall back to
//! copy plus delete.

#![deny(unsafe_code)]

pub mod engine;
pub mod errors;
pub mod fsops;
pub mod paths;

pub use engine::{MigrationEngine, MigrationReport};
pub use errors::{MigrateError, Result};
pub use paths::WORKTREES_DIR;
