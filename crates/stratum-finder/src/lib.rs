//! Stratum Finder - the bootstrap capability finder.
//!
//! [`PluginServiceFinder`] is the [`ServiceFinder`](stratum_layer::ServiceFinder)
//! the host deploys into the `finder-layer` domain. Its code is linked into
//! the host and registered with [`register`]; the package that makes the
//! host deploy it carries only [`MODULE_DESCRIPTOR`] and is written with
//! [`write_package`].
//!
//! # Example
//!
//! ```rust,no_run
//! use stratum_layer::{StratumHost, TypeCatalog, WatchDirectory};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = TypeCatalog::new();
//! stratum_finder::register(&catalog);
//! stratum_finder::write_package(std::path::Path::new("libs"), "plugin-service-loader")?;
//!
//! let host = StratumHost::builder(".").catalog(catalog).build();
//! let manager = host.set_watch_directory(WatchDirectory::new("plugins", "plugins"))?;
//! assert!(manager.finder().is_some());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod finder;
mod package;

pub use finder::{FINDER_MODULE, FINDER_TYPE, MODULE_DESCRIPTOR, PluginServiceFinder, register};
pub use package::{package_file_name, write_package};
