//! Subscriber configuration for the host and its tools.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

/// How each event is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Multi-line, colored, for reading at a terminal.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
    /// The `tracing-subscriber` default layout.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            _ => Err(TelemetryError::UnknownFormat(name.to_owned())),
        }
    }
}

/// Where rendered events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    /// Log to stdout.
    Stdout,
    /// Log to stderr.
    #[default]
    Stderr,
    /// Log to daily-rotated files in a directory.
    File(PathBuf),
}

/// Everything needed to install the global subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Base filter, e.g. `info` or `warn,stratum_layer=debug`.
    pub level: String,
    /// Event layout.
    #[serde(default)]
    pub format: LogFormat,
    /// Output sink.
    #[serde(default)]
    pub target: LogTarget,
    /// File name prefix used when the target is a directory.
    #[serde(default = "file_prefix_default")]
    pub file_prefix: String,
    /// Print source file and line with each event.
    #[serde(default)]
    pub file_info: bool,
    /// Emit ANSI color codes.
    #[serde(default = "ansi_default")]
    pub ansi: bool,
    /// Extra per-target directives layered over `level`.
    #[serde(default)]
    pub directives: Vec<String>,
}

fn file_prefix_default() -> String {
    "stratum".to_owned()
}

const fn ansi_default() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    /// Compact stderr output filtered at `level`.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Compact,
            target: LogTarget::Stderr,
            file_prefix: file_prefix_default(),
            file_info: false,
            ansi: ansi_default(),
            directives: vec![],
        }
    }

    /// Build a log config from the `[logging]` config section.
    ///
    /// A relative `directory` is taken relative to `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the section names an unknown format.
    #[cfg(feature = "config")]
    pub fn from_section(
        section: &stratum_config::LoggingSection,
        base_dir: &std::path::Path,
    ) -> TelemetryResult<Self> {
        let mut config = Self::new(section.level.clone()).with_format(section.format.parse()?);
        config.directives.clone_from(&section.directives);
        if let Some(dir) = &section.directory {
            config = config.with_file_logging(base_dir.join(dir), section.file_prefix.clone());
        }
        if section.file_info {
            config = config.with_file_info();
        }
        Ok(config)
    }

    /// Replace the event layout.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Replace the output sink.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Log to daily-rotated files in `directory`.
    #[must_use]
    pub fn with_file_logging(
        mut self,
        dir: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
    ) -> Self {
        self.target = LogTarget::File(dir.into());
        self.file_prefix = file_prefix.into();
        self.ansi = false;
        self
    }

    /// Append a per-target directive such as `stratum_finder=trace`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        let directive = directive.into();
        self.directives.push(directive);
        self
    }

    /// Print source locations.
    #[must_use]
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Strip color codes.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let invalid = |filter: &str, e: tracing_subscriber::filter::ParseError| {
            TelemetryError::InvalidFilter {
                filter: filter.to_string(),
                message: e.to_string(),
            }
        };

        let filter = EnvFilter::try_new(&self.level).map_err(|e| invalid(&self.level, e))?;
        self.directives
            .iter()
            .try_fold(filter, |acc, raw| -> TelemetryResult<EnvFilter> {
                Ok(acc.add_directive(raw.parse().map_err(|e| invalid(raw, e))?))
            })
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn format_layer<W>(config: &LogConfig, writer: W) -> BoxedLayer
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    let located = config.file_info;
    let base = fmt::layer()
        .with_writer(writer)
        .with_file(located)
        .with_line_number(located)
        .with_ansi(config.ansi);

    match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Full => base.boxed(),
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails on a malformed filter, an unwritable log directory, or when a
/// subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let env_filter = config.build_filter()?;

    let layer = match &config.target {
        LogTarget::Stdout => format_layer(config, std::io::stdout),
        LogTarget::Stderr => format_layer(config, std::io::stderr),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| TelemetryError::LogDirectory {
                path: dir.clone(),
                source,
            })?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, &config.file_prefix);
            format_layer(config, appender)
        },
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

/// Set up compact stderr logging at `info`, honoring `RUST_LOG` if set.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn setup_default_logging() -> TelemetryResult<()> {
    let level = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| "info".to_owned());
    setup_logging(&LogConfig::new(level))
}
