//! `layers` command.

use std::path::Path;

use anyhow::Result;
use serde_json::json;
use stratum_config::Config;

use crate::theme::Theme;
use crate::{HostArgs, OutputFormat};

/// Initialize a host and list every live domain.
pub(crate) fn run_layers(
    working_dir: &Path,
    config: Config,
    args: &HostArgs,
    format: OutputFormat,
) -> Result<()> {
    let manager = super::start_host(working_dir, config, args)?;
    let domains = manager.domains();
    let finder = manager.finder();

    if format == OutputFormat::Json {
        let items: Vec<_> = domains
            .iter()
            .map(|d| {
                json!({
                    "name": d.name(),
                    "id": d.id().to_string(),
                    "generation": d.generation(),
                    "parents": d.parents().iter().map(|p| p.name()).collect::<Vec<_>>(),
                    "modules": d.modules().iter().map(|m| m.name()).collect::<Vec<_>>(),
                })
            })
            .collect();
        let value = json!({
            "generation": manager.generation(),
            "domains": items,
            "finder": finder.as_ref().map(|f| json!({
                "domain": f.domain().name(),
                "module": f.module().name(),
            })),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{}",
        Theme::header(&format!("Layers (generation {})", manager.generation()))
    );
    println!("{}", Theme::separator());
    for domain in &domains {
        println!("  {}", domain.name());
        let parents: Vec<&str> = domain.parents().iter().map(|p| p.name()).collect();
        if !parents.is_empty() {
            println!("{}", Theme::kv("parents", &parents.join(", ")));
        }
        for module in domain.modules() {
            let label = if module.is_automatic() {
                format!("{} {}", module.name(), Theme::dimmed("(automatic)"))
            } else {
                module.name().to_string()
            };
            println!("{}", Theme::kv("module", &label));
        }
    }
    println!();
    match finder {
        Some(f) => println!(
            "{}",
            Theme::success(&format!(
                "finder {} installed in {}",
                f.module().name(),
                f.domain().name()
            ))
        ),
        None => println!("{}", Theme::warning("no finder installed")),
    }
    Ok(())
}
