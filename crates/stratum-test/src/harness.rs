//! Test harness helpers.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness at `directives`.
///
/// Every test may call this. The first call in a process wins.
pub fn setup_test_logging(directives: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_test_writer()
        .try_init();
}

/// A throwaway host working directory.
///
/// Holds a `plugins/` directory for plugin packages and a `libs/`
/// directory, outside every watch directory, for finder artifacts.
#[derive(Debug)]
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Create a new workspace with empty `plugins/` and `libs/` directories.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directories cannot be created.
    pub fn new() -> Self {
        let dir = TempDir::with_prefix("stratum-").expect("Failed to create temp directory");
        std::fs::create_dir_all(dir.path().join("plugins"))
            .expect("Failed to create plugins directory");
        std::fs::create_dir_all(dir.path().join("libs")).expect("Failed to create libs directory");
        Self { dir }
    }

    /// Root of the workspace, used as the host working directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The plugins directory.
    pub fn plugins(&self) -> PathBuf {
        self.dir.path().join("plugins")
    }

    /// The library directory searched for finder artifacts.
    pub fn libs(&self) -> PathBuf {
        self.dir.path().join("libs")
    }

    /// `name` under the workspace root, created with its parents.
    ///
    /// # Panics
    ///
    /// If the directory cannot be created.
    pub fn subdir(&self, name: &str) -> PathBuf {
        let created = self.dir.path().join(name);
        std::fs::create_dir_all(&created)
            .unwrap_or_else(|e| panic!("cannot create {}: {e}", created.display()));
        created
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
