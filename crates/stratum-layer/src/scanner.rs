//! Artifact scanner.
//!
//! Walks a watch directory depth-first and collects every file with a
//! recognized package extension. Scanning never fails: a missing root yields
//! nothing and unreadable entries are logged and skipped.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::naming::parse_artifact_name;
use crate::package::PackageKind;

/// Scanner options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into and report dot-prefixed entries.
    pub include_hidden: bool,
    /// Follow symbolic links. Link cycles are reported by the walker and
    /// skipped.
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            follow_links: true,
        }
    }
}

impl From<&stratum_config::ScanSection> for ScanOptions {
    fn from(section: &stratum_config::ScanSection) -> Self {
        Self {
            include_hidden: section.include_hidden,
            follow_links: section.follow_links,
        }
    }
}

/// A package file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArtifact {
    /// Path to the package file.
    pub path: PathBuf,
    /// Package format.
    pub kind: PackageKind,
    /// Artifact id from `{id}-{version}.{ext}`, if the name conforms.
    pub inferred_name: Option<String>,
}

/// Recursively collect package files under `root`, sorted by path.
#[must_use]
pub fn scan_artifacts(root: &Path, options: &ScanOptions) -> Vec<DiscoveredArtifact> {
    if !root.is_dir() {
        debug!(path = %root.display(), "watch directory missing, nothing to scan");
        return Vec::new();
    }

    let include_hidden = options.include_hidden;
    let mut artifacts = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(options.follow_links)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || include_hidden || !is_hidden(e.file_name()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            },
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(kind) = PackageKind::from_file_name(file_name) else {
            continue;
        };
        artifacts.push(DiscoveredArtifact {
            path: entry.path().to_path_buf(),
            kind,
            inferred_name: parse_artifact_name(file_name).map(|n| n.id),
        });
    }

    artifacts.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(root = %root.display(), count = artifacts.len(), "scanned watch directory");
    artifacts
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
