//! Error types for hook handling and reconciliation.

use thiserror::Error;

/// Errors surfaced by hook application and startup reconciliation.
#[derive(Debug, Error)]
pub enum HookError {
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] corral_store::SessionStoreError),

    /// Multiplexer probe failed.
    #[error(transparent)]
    Mux(#[from] corral_mux::MuxError),
}

/// Convenience type alias for hook results.
pub type Result<T> = std::result::Result<T, HookError>;
