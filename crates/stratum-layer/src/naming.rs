//! Plugin identity from package filenames.
//!
//! Package files are expected to be named `{id}-{version}.{ext}`, where the
//! version starts with a digit and `ext` is one of `jar`, `zip`, `tar` or
//! `tar.gz`. Names that don't fit simply have no inferred identity.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::watch::WatchDirectory;

static ARTIFACT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(.*?)-(\d[\d+\-_A-Za-z.]*?)\.(jar|zip|tar|tar\.gz)$").ok()
});

/// The parts of a conforming package filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    /// Artifact id (everything before the version).
    pub id: String,
    /// Version string.
    pub version: String,
    /// Package extension without the leading dot.
    pub extension: String,
}

impl ArtifactName {
    /// Disambiguated key `{dir}-{id}-{version}`.
    #[must_use]
    pub fn qualified_key(&self, dir_name: &str) -> String {
        format!("{dir_name}-{}-{}", self.id, self.version)
    }
}

/// Parse a package filename into id, version and extension.
///
/// Returns `None` for names that don't match `{id}-{version}.{ext}`.
#[must_use]
pub fn parse_artifact_name(file_name: &str) -> Option<ArtifactName> {
    let caps = ARTIFACT_PATTERN.as_ref()?.captures(file_name)?;
    Some(ArtifactName {
        id: caps.get(1)?.as_str().to_string(),
        version: caps.get(2)?.as_str().to_string(),
        extension: caps.get(3)?.as_str().to_string(),
    })
}

/// Plugin name for a package found under `watch_dir`.
///
/// Returns the bare artifact id. The qualified key including the watch
/// directory and version is only traced, so two watch directories that
/// both carry `widget-*.jar` yield the same plugin name.
#[must_use]
pub fn plugin_name(watch_dir: &WatchDirectory, path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = parse_artifact_name(file_name)?;
    trace!(
        key = %name.qualified_key(&watch_dir.dir_name()),
        id = %name.id,
        "derived plugin name"
    );
    Some(name.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_versioned_name() {
        let name = parse_artifact_name("widget-1.2.3.jar").unwrap();
        assert_eq!(name.id, "widget");
        assert_eq!(name.version, "1.2.3");
        assert_eq!(name.extension, "jar");
    }

    #[test]
    fn unversioned_name_has_no_match() {
        assert!(parse_artifact_name("widget.jar").is_none());
        assert!(parse_artifact_name("widget-snapshot.jar").is_none());
    }

    #[test]
    fn hyphenated_id() {
        let name = parse_artifact_name("a-b-2.0.jar").unwrap();
        assert_eq!(name.id, "a-b");
        assert_eq!(name.version, "2.0");
    }

    #[test]
    fn tar_gz_extension() {
        let name = parse_artifact_name("widget-1.0-SNAPSHOT.tar.gz").unwrap();
        assert_eq!(name.id, "widget");
        assert_eq!(name.version, "1.0-SNAPSHOT");
        assert_eq!(name.extension, "tar.gz");
    }

    #[test]
    fn unknown_extension() {
        assert!(parse_artifact_name("widget-1.0.rar").is_none());
    }

    #[test]
    fn plugin_name_is_bare_id() {
        let a = WatchDirectory::new("first", "/opt/a/plugins");
        let b = WatchDirectory::new("second", "/opt/b/extra");
        let path_a = Path::new("/opt/a/plugins/widget-1.0.jar");
        let path_b = Path::new("/opt/b/extra/widget-2.0.jar");

        assert_eq!(plugin_name(&a, path_a).as_deref(), Some("widget"));
        assert_eq!(plugin_name(&a, path_a), plugin_name(&b, path_b));
    }

    #[test]
    fn qualified_key_includes_dir_and_version() {
        let name = parse_artifact_name("widget-1.0.zip").unwrap();
        assert_eq!(name.qualified_key("plugins"), "plugins-widget-1.0");
    }
}
