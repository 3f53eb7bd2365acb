//! SQLite persistence layer.
//!
//! ## Architecture
//!
//! - [`connection`] — r2d2 connection pooling with per-connection pragmas
//!   (WAL, busy timeout, foreign keys).
//! - [`migrations`] — embedded, versioned schema migrations.
//! - [`row_types`] — raw row shapes matching the schema.
//! - [`repositories`] — stateless CRUD over rows; callers own transactions.
//!
//! The [`crate::store::SessionStore`] facade composes these into the public
//! API. Nothing outside this crate should need to touch a raw connection.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod row_types;

pub use connection::{
    db_path, new_file, new_in_memory, verify_pragmas, ConnectionConfig, ConnectionPool,
    PooledConnection, PragmaState, DB_FILE_NAME,
};
pub use migrations::{current_version, latest_version, run_migrations};
pub use repositories::{OverlayBundle, OverlayRepo, SessionRepo};
pub use row_types::SessionRow;
