//! Plugin layers for the Stratum host.
//!
//! Discovers plugin packages in watch directories, resolves their modules
//! into isolated domains parented on a boot domain, and bootstraps a
//! capability finder that looks up providers across every live domain.
//!
//! - [`WatchDirectory`]: a configured root scanned for packages
//! - [`scan_artifacts`] / [`plugin_name`]: package discovery and naming
//! - [`Package`] / [`PackageDescriptor`]: `Module.toml` inside `.jar`, `.zip`,
//!   `.tar` and `.tar.gz` packages
//! - [`LayerBuilder`]: resolves a closed module graph into one [`Domain`]
//! - [`LayerRegistry`]: the live domains, replaced wholesale per rescan
//! - [`TypeCatalog`]: the code behind declared type names
//! - [`ServiceFinder`] / [`BootstrapLocator`]: cross-domain discovery and
//!   how it is deployed
//! - [`StratumHost`] / [`ServiceManager`]: one-time initialization and the
//!   lookup surface consumers use
//!
//! # Declared interest
//!
//! A module may only look up capabilities it declares in its `uses` list or
//! has recorded at runtime through [`Module::ensure_uses`]. The service
//! manager records interest on the finder's module before every lookup, so
//! callers can search for capabilities unknown when the finder was built.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bootstrap;
pub mod builder;
pub mod catalog;
pub mod descriptor;
pub mod domain;
pub mod error;
pub mod finder;
pub mod host;
pub mod listener;
pub mod naming;
pub mod package;
pub mod registry;
pub mod scanner;
pub mod service;
pub mod watch;

pub use bootstrap::{BootstrapLocator, FINDER_DOMAIN, find_finder_artifact};
pub use builder::LayerBuilder;
pub use catalog::{Factory, Instance, ProviderContext, TypeCatalog, into_instance};
pub use descriptor::{DESCRIPTOR_FILE_NAME, ModuleDescriptor, PackageDescriptor, ProvidesDescriptor};
pub use domain::{BOOT_DOMAIN, CapabilityInterestRecord, Domain, Module, TypeHandle};
pub use error::{ErrorClass, LayerError, LayerResult};
pub use finder::{FINDER_CAPABILITY, FinderCapability, ServiceFinder};
pub use host::{HOST_MODULE, HostBuilder, ServiceManager, StratumHost, host_module};
pub use listener::{
    LISTENER_CAPABILITY, LOGGING_LISTENER_TYPE, LayerLifecycleListener, ListenerCapability,
    LoggingLifecycleListener,
};
pub use naming::{ArtifactName, parse_artifact_name, plugin_name};
pub use package::{Package, PackageKind};
pub use registry::LayerRegistry;
pub use scanner::{DiscoveredArtifact, ScanOptions, scan_artifacts};
pub use service::{Capability, CapabilityId, Provider, ProviderScope, ProviderSequence};
pub use watch::{STANDARD_WATCH_DIRECTORY_NAME, WatchDirectory};
