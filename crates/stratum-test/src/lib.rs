//! Stratum Test - shared test utilities for the plugin-layer host.
//!
//! This crate provides:
//! - [`PackageFixture`] for writing plugin packages (`.jar`, `.zip`, `.tar`,
//!   `.tar.gz`) with an optional module descriptor
//! - [`TestWorkspace`] for a throwaway working directory with a plugins
//!   directory and a separate library directory for finder artifacts
//! - Test logging setup
//!
//! This crate deliberately depends on no other Stratum crate so that every
//! crate in the workspace can use it as a dev-dependency.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![allow(clippy::must_use_candidate)]

mod fixtures;
mod harness;

pub use fixtures::{DESCRIPTOR_FILE_NAME, PackageFixture};
pub use harness::{TestWorkspace, setup_test_logging};
