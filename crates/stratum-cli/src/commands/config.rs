//! Config commands.

use anyhow::Result;
use stratum_config::{ConfigResult, ResolvedConfig, ShowFormat};

use crate::OutputFormat;
use crate::theme::Theme;

/// Print the effective configuration.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn show_config(resolved: &ResolvedConfig, format: OutputFormat) -> Result<()> {
    let show_format = match format {
        OutputFormat::Json => ShowFormat::Json,
        OutputFormat::Pretty => ShowFormat::Toml,
    };
    println!("{}", resolved.render(show_format));
    Ok(())
}

/// Report whether configuration loaded and validated.
pub(crate) fn validate_config(resolved: ConfigResult<ResolvedConfig>) -> Result<()> {
    let resolved = resolved?;
    println!("{}", Theme::success("Configuration is valid."));
    if !resolved.loaded_files.is_empty() {
        println!("\nLoaded files:");
        for path in &resolved.loaded_files {
            println!("  - {path}");
        }
    }
    Ok(())
}
