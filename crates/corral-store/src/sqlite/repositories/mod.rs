//! Repository implementations for database access.
//!
//! Repositories are stateless — each method takes a `&Connection` so callers
//! control transaction boundaries. The store facade composes repository calls
//! inside transactions; repositories themselves never begin or commit.

mod overlay;
mod session;

pub use overlay::{OverlayBundle, OverlayRepo};
pub use session::SessionRepo;
