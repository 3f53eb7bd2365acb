//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON wire
//! format. Each type implements [`Default`] with production default values.
//! `#[serde(default)]` allows partial JSON — missing fields get their default
//! value during deserialization.

use std::path::PathBuf;

use corral_core::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Root settings type for corral.
///
/// Loaded from `~/.corral/settings.json` with defaults applied for missing
/// fields. `CORRAL_*` environment variables can override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "state": { "root": "~/.corral" },
///   "store": { "poolSize": 16, "retry": { "maxRetries": 3 } }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorralSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// State-root directory settings.
    pub state: StateSettings,
    /// Session store tuning.
    pub store: StoreSettings,
    /// Terminal multiplexer settings.
    pub tmux: TmuxSettings,
    /// Version control settings.
    pub git: GitSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for CorralSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "corral".to_string(),
            state: StateSettings::default(),
            store: StoreSettings::default(),
            tmux: TmuxSettings::default(),
            git: GitSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl CorralSettings {
    /// The state-root directory with a leading `~` expanded against `$HOME`.
    #[must_use]
    pub fn state_root(&self) -> PathBuf {
        expand_home(&self.state.root)
    }
}

/// State-root directory settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateSettings {
    /// Directory holding the database and per-session working trees.
    pub root: String,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            root: "~/.corral".to_string(),
        }
    }
}

/// Session store tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Maximum connection pool size.
    pub pool_size: u32,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// SQLite page cache size in KiB.
    pub cache_size_kib: i64,
    /// Retry policy for busy/locked errors.
    pub retry: RetryPolicy,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
            retry: RetryPolicy::default(),
        }
    }
}

/// Terminal multiplexer settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TmuxSettings {
    /// Binary name or path used to invoke tmux.
    pub bin: String,
}

impl Default for TmuxSettings {
    fn default() -> Self {
        Self {
            bin: "tmux".to_string(),
        }
    }
}

/// Version control settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitSettings {
    /// Binary name or path used to invoke git.
    pub bin: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            bin: "git".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default log level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Expand a leading `~` or `~/` against `$HOME` (`/tmp` when unset).
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    let home = || PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()));
    if path == "~" {
        home()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
