//! Durable session storage backed by SQLite.
//!
//! The session database is the single source of truth for session records,
//! their ordering, and their annotation overlays. Multiple processes share
//! one database file under the state root; WAL mode, foreign keys, and a
//! busy-retry policy keep concurrent access safe.
//!
//! # Layers
//!
//! - [`store::SessionStore`] — the facade every caller goes through.
//! - [`sqlite`] — pool, migrations, row types, repositories.
//! - [`errors`] — the crate error taxonomy.

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{Result, SessionStoreError};
pub use sqlite::connection::{db_path, DB_FILE_NAME};
pub use store::{SessionStore, StoreConfig};
