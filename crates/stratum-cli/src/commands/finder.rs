//! `install-finder` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use stratum_config::Config;

use crate::OutputFormat;
use crate::theme::Theme;

/// Write the finder package where the bootstrap search will find it.
pub(crate) fn install_finder(dir: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let path = stratum_finder::write_package(dir, &config.finder.artifact_key)
        .with_context(|| format!("failed to write finder package to {}", dir.display()))?;

    if format == OutputFormat::Json {
        let value = json!({ "path": path.display().to_string() });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{}",
        Theme::success(&format!("wrote {}", path.display()))
    );
    if config.finder.path.is_some() {
        println!(
            "{}",
            Theme::warning("finder.path is set and takes priority over this package")
        );
    }
    Ok(())
}
