//! Layered configuration for the Stratum plugin-layer host.
//!
//! The host reads a single [`Config`] once, when it is built: where the
//! bootstrap finder package lives or how to search for it, how watch
//! directories are scanned, where the standard plugins directory is, and
//! how logging is set up.
//!
//! ```rust,no_run
//! use stratum_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("finder artifact key: {}", resolved.config.finder.artifact_key);
//! ```
//!
//! Layers, lowest priority first:
//!
//! 1. `defaults.toml`, embedded in the binary
//! 2. `/etc/stratum/config.toml`
//! 3. `~/.stratum/config.toml`
//! 4. `{workspace}/.stratum/config.toml`
//!
//! `STRATUM_*` environment variables only fill fields that no file set.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// `STRATUM_*` environment fallbacks.
pub mod env;
/// Error types.
pub mod error;
/// File discovery and layered loading.
pub mod loader;
/// Tree merging with per-field source tracking.
pub mod merge;
/// Rendering the effective configuration.
pub mod show;
/// Configuration sections.
pub mod types;
/// Post-merge validation.
pub mod validate;

use std::path::Path;

pub use error::{ConfigError, ConfigResult};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load every layer for `workspace_root`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is unreadable or malformed, or if
    /// the merged result is invalid.
    pub fn load(workspace_root: Option<&Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load every layer, reading user config from `home_dir` instead of
    /// `~/.stratum`.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_home(
        workspace_root: Option<&Path>,
        home_dir: &Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(home_dir))
    }

    /// Load one file on its own, without defaults or env fallbacks.
    ///
    /// # Errors
    ///
    /// See [`loader::load_file`].
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
