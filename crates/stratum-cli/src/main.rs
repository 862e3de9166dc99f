//! Stratum CLI - inspect plugin layers from the command line.
//!
//! Every command that needs layers builds a fresh host for the current
//! directory, initializes it once and reports what it sees. Nothing is
//! kept between invocations.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

mod commands;
mod theme;

use commands::{config, finder, layers, lookup, scan};

/// Stratum - plugin-layer host
#[derive(Parser)]
#[command(name = "stratum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Colored, human-readable text
    Pretty,
    /// One JSON document on stdout
    Json,
}

/// Options shared by commands that initialize a host.
#[derive(Debug, Clone, Args)]
pub(crate) struct HostArgs {
    /// Watch directory (defaults to the configured plugins directory)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Finder package path, overriding `finder.path`
    #[arg(long)]
    finder: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List plugin packages under a directory
    Scan {
        /// Directory to scan
        dir: PathBuf,
    },

    /// Show the plugin identity inferred from a package filename
    Name {
        /// Package file name or path
        file: PathBuf,
    },

    /// Initialize a host and list its layers
    Layers {
        #[command(flatten)]
        host: HostArgs,
    },

    /// Find providers of a capability across all layers
    Find {
        /// Capability id, e.g. `demo.Greeter`
        capability: String,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Resolve a type name to the layer that declares it
    Resolve {
        /// Fully qualified type name
        type_name: String,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Write the bootstrap finder package
    InstallFinder {
        /// Target directory (must not be a watch directory)
        #[arg(short, long, default_value = "libs")]
        dir: PathBuf,
    },

    /// View and validate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration files
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let workspace_root = std::env::current_dir()?;
    let resolved = stratum_config::Config::load(Some(&workspace_root));

    // Set up logging from config, with --verbose override.
    let mut log_config = match &resolved {
        Ok(r) => stratum_telemetry::LogConfig::from_section(&r.config.logging, &workspace_root)
            .unwrap_or_else(|_| stratum_telemetry::LogConfig::new("info")),
        Err(_) => stratum_telemetry::LogConfig::new("info"),
    };
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = stratum_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Scan { dir } => scan::run_scan(&dir, &resolved?.config.scan, cli.format),
        Commands::Name { file } => scan::run_name(&file, cli.format),
        Commands::Layers { host } => {
            layers::run_layers(&workspace_root, resolved?.config, &host, cli.format)
        },
        Commands::Find { capability, host } => lookup::run_find(
            &workspace_root,
            resolved?.config,
            &host,
            &capability,
            cli.format,
        ),
        Commands::Resolve { type_name, host } => lookup::run_resolve(
            &workspace_root,
            resolved?.config,
            &host,
            &type_name,
            cli.format,
        ),
        Commands::InstallFinder { dir } => {
            finder::install_finder(&workspace_root.join(dir), &resolved?.config, cli.format)
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => config::show_config(&resolved?, cli.format),
            ConfigCommands::Validate => config::validate_config(resolved),
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn find_accepts_host_args() {
        let cli = Cli::try_parse_from([
            "stratum", "--format", "json", "find", "demo.Greeter", "--dir", "plugins",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Find { capability, host } => {
                assert_eq!(capability, "demo.Greeter");
                assert_eq!(host.dir, Some(PathBuf::from("plugins")));
            },
            _ => panic!("expected find"),
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["stratum", "--format", "xml", "layers"]).is_err());
    }
}
