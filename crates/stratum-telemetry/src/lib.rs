//! Stratum Telemetry - logging setup for the plugin-layer host.
//!
//! Wraps `tracing-subscriber` so binaries and tests configure output the
//! same way: a level plus per-crate directives, one of four formats, and a
//! stdout, stderr, or rolling-file target.
//!
//! # Example
//!
//! ```rust,no_run
//! use stratum_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), stratum_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("stratum_layer=debug");
//! setup_logging(&config)?;
//! tracing::info!("host starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
