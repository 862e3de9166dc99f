//! Watch directory descriptors.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{LayerError, LayerResult};

/// Display name used for the conventional plugins directory.
pub const STANDARD_WATCH_DIRECTORY_NAME: &str = "Standard plugins directory";

/// A configured filesystem root scanned for plugin packages.
///
/// Immutable once created. The display name becomes the name of the domain
/// built from the directory's packages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchDirectory {
    name: String,
    path: PathBuf,
}

impl WatchDirectory {
    /// Create a watch directory descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// The conventional plugins directory for a working directory.
    ///
    /// Uses `<working_dir>/target/plugins` when `<working_dir>/target`
    /// exists (a development checkout), else `<working_dir>/plugins`. The
    /// directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Io`] if the directory cannot be created.
    pub fn standard(working_dir: &Path) -> LayerResult<Self> {
        let target = working_dir.join("target");
        let path = if target.is_dir() {
            target.join("plugins")
        } else {
            working_dir.join("plugins")
        };
        std::fs::create_dir_all(&path).map_err(|e| LayerError::io(&path, e))?;
        Ok(Self::new(STANDARD_WATCH_DIRECTORY_NAME, path))
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final component of the root path, used when deriving qualified
    /// artifact keys.
    #[must_use]
    pub fn dir_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for WatchDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}
