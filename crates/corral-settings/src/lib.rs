//! # corral-settings
//!
//! Configuration management with layered sources for corral.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`CorralSettings::default()`]
//! 2. **User file** — `~/.corral/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `CORRAL_*` overrides (highest priority)
//!
//! There is no process-wide settings global: settings are loaded once at
//! startup and passed by value into the constructors that need them. Every
//! corral process (front end, hook callback, one-off CLI command) loads its
//! own copy against the same file.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
