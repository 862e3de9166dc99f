//! `find` and `resolve` commands.

use std::path::Path;

use anyhow::Result;
use serde_json::json;
use stratum_config::Config;
use stratum_layer::CapabilityId;

use crate::theme::Theme;
use crate::{HostArgs, OutputFormat};

/// List the providers of a capability across every layer.
pub(crate) fn run_find(
    working_dir: &Path,
    config: Config,
    args: &HostArgs,
    capability: &str,
    format: OutputFormat,
) -> Result<()> {
    let capability = CapabilityId::new(capability)?;
    let manager = super::start_host(working_dir, config, args)?;
    let providers = manager.find(&capability)?;

    if format == OutputFormat::Json {
        let items: Vec<_> = providers
            .iter()
            .map(|p| {
                json!({
                    "type": p.type_name(),
                    "module": p.module().name(),
                    "domain": p.domain().name(),
                })
            })
            .collect();
        let value = json!({ "capability": capability.as_str(), "providers": items });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", Theme::header(&format!("Providers of {capability}")));
    println!("{}", Theme::separator());
    if providers.is_empty() {
        println!("{}", Theme::warning("no providers found"));
        return Ok(());
    }
    for provider in &providers {
        println!(
            "  {}  {}",
            provider.type_name(),
            Theme::dimmed(&format!(
                "{} in {}",
                provider.module().name(),
                provider.domain().name()
            ))
        );
    }
    Ok(())
}

/// Resolve a type name to the domain and module that declare it.
pub(crate) fn run_resolve(
    working_dir: &Path,
    config: Config,
    args: &HostArgs,
    type_name: &str,
    format: OutputFormat,
) -> Result<()> {
    let manager = super::start_host(working_dir, config, args)?;
    let handle = manager.resolve_type(type_name)?;

    if format == OutputFormat::Json {
        let value = json!({
            "type": handle.name(),
            "module": handle.module().name(),
            "domain": handle.domain().name(),
            "domain_id": handle.domain().id().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", Theme::header(handle.name()));
    println!("{}", Theme::kv("module", handle.module().name()));
    println!("{}", Theme::kv("domain", handle.domain().name()));
    Ok(())
}
