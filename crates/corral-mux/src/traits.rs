//! The multiplexer capability trait.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::Result;

/// Terminal multiplexer operations the rest of the system depends on.
///
/// Production code uses [`crate::TmuxMultiplexer`]; tests use
/// [`crate::FakeMultiplexer`]. Callers hold an `Arc<dyn Multiplexer>`.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Create a detached session rooted at `cwd` with extra environment
    /// variables injected into it.
    async fn create(&self, name: &str, cwd: &Path, env: &[(String, String)]) -> Result<()>;

    /// Kill a session.
    async fn kill(&self, name: &str) -> Result<()>;

    /// Whether a session with this name exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Names of all live sessions.
    async fn list(&self) -> Result<Vec<String>>;

    /// Type literal input into a session, followed by Enter.
    async fn send_keys(&self, name: &str, input: &str) -> Result<()>;

    /// Rename a session.
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Whether an agent process is still running in one of the
    /// session's panes.
    async fn agent_running(&self, name: &str) -> Result<bool>;
}
