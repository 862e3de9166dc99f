//! Command implementations.

pub(crate) mod config;
pub(crate) mod finder;
pub(crate) mod layers;
pub(crate) mod lookup;
pub(crate) mod scan;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use stratum_config::Config;
use stratum_layer::{ServiceManager, StratumHost, TypeCatalog, WatchDirectory};

use crate::HostArgs;

/// Build a host for `working_dir` and initialize it once.
///
/// The finder's code is always registered; plugin types without linked code
/// are still listed but cannot be instantiated.
pub(crate) fn start_host(
    working_dir: &Path,
    mut config: Config,
    args: &HostArgs,
) -> Result<Arc<ServiceManager>> {
    if let Some(finder) = &args.finder {
        config.finder.path = Some(finder.display().to_string());
    }

    let catalog = TypeCatalog::new();
    stratum_finder::register(&catalog);

    let host = StratumHost::builder(working_dir)
        .config(config)
        .catalog(catalog)
        .build();

    let manager = match &args.dir {
        Some(dir) => {
            let path = working_dir.join(dir);
            let name = dir.display().to_string();
            host.set_watch_directory(WatchDirectory::new(name, path))
        },
        None => host.start(),
    }
    .context("failed to initialize plugin layers")?;

    Ok(manager)
}
