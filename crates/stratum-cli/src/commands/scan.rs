//! `scan` and `name` commands.

use std::path::Path;

use anyhow::Result;
use serde_json::json;
use stratum_config::ScanSection;
use stratum_layer::{ScanOptions, parse_artifact_name, scan_artifacts};

use crate::OutputFormat;
use crate::theme::Theme;

/// List the packages a rescan would pick up under `dir`.
pub(crate) fn run_scan(dir: &Path, section: &ScanSection, format: OutputFormat) -> Result<()> {
    let artifacts = scan_artifacts(dir, &ScanOptions::from(section));

    if format == OutputFormat::Json {
        let items: Vec<_> = artifacts
            .iter()
            .map(|a| {
                json!({
                    "path": a.path.display().to_string(),
                    "kind": a.kind.extension(),
                    "name": a.inferred_name,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!("{}", Theme::header(&format!("Packages in {}", dir.display())));
    println!("{}", Theme::separator());
    if artifacts.is_empty() {
        println!("{}", Theme::warning("no plugin packages found"));
        return Ok(());
    }
    for artifact in &artifacts {
        let name = artifact
            .inferred_name
            .as_deref()
            .map_or_else(|| Theme::dimmed("(no inferred name)"), str::to_string);
        println!(
            "  {:<7} {:<30} {}",
            artifact.kind.extension(),
            name,
            Theme::dimmed(&artifact.path.display().to_string())
        );
    }
    println!();
    println!("{} package(s)", artifacts.len());
    Ok(())
}

/// Show the identity parsed out of a package file name.
pub(crate) fn run_name(file: &Path, format: OutputFormat) -> Result<()> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("not a file name: {}", file.display()))?;
    let parsed = parse_artifact_name(file_name);

    if format == OutputFormat::Json {
        let value = match &parsed {
            Some(n) => json!({
                "file": file_name,
                "id": n.id,
                "version": n.version,
                "extension": n.extension,
            }),
            None => json!({ "file": file_name, "id": null }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match parsed {
        Some(n) => {
            println!("{}", Theme::kv("id", &n.id));
            println!("{}", Theme::kv("version", &n.version));
            println!("{}", Theme::kv("extension", &n.extension));
        },
        None => println!(
            "{}",
            Theme::warning(&format!("'{file_name}' does not match {{id}}-{{version}}.{{ext}}"))
        ),
    }
    Ok(())
}
