//! Configuration types for the Stratum host.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML produces a working configuration.

use serde::{Deserialize, Serialize};

/// Default filename prefix of the bootstrap finder artifact.
pub const DEFAULT_FINDER_ARTIFACT_KEY: &str = "plugin-service-loader";

/// Default display name of the standard plugins directory.
pub const DEFAULT_PLUGINS_DIRECTORY_NAME: &str = "Standard plugins directory";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How the bootstrap finder artifact is located.
    pub finder: FinderSection,
    /// How watch directories are scanned.
    pub scan: ScanSection,
    /// Where the standard plugins directory lives.
    pub plugins: PluginsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Bootstrap finder location settings.
///
/// Both values are read once when the host is created and never re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderSection {
    /// Explicit path to the finder artifact. Takes priority over the search.
    pub path: Option<String>,
    /// Filename prefix used to search for the finder artifact when no
    /// explicit path is configured.
    pub artifact_key: String,
}

impl Default for FinderSection {
    fn default() -> Self {
        Self {
            path: None,
            artifact_key: DEFAULT_FINDER_ARTIFACT_KEY.to_owned(),
        }
    }
}

/// Watch-directory scanning settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Include dot-prefixed files and directories in artifact scans.
    pub include_hidden: bool,
    /// Follow symbolic links while scanning.
    pub follow_links: bool,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            include_hidden: false,
            follow_links: true,
        }
    }
}

/// Standard plugins directory settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Explicit plugins directory. `None` uses `target/plugins` when a
    /// `target` directory exists in the working directory, else `plugins`.
    pub directory: Option<String>,
    /// Display name given to the watch directory.
    pub name: String,
}

impl Default for PluginsSection {
    fn default() -> Self {
        Self {
            directory: None,
            name: DEFAULT_PLUGINS_DIRECTORY_NAME.to_owned(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["stratum_layer=debug"]`).
    pub directives: Vec<String>,
    /// Write daily-rotated log files here instead of stderr.
    pub directory: Option<String>,
    /// Prefix for the rotated file names.
    pub file_prefix: String,
    /// Print source file and line with each event.
    pub file_info: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
            file_prefix: "stratum".to_owned(),
            file_info: false,
        }
    }
}
