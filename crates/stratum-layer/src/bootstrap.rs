//! Bootstrap finder location and deployment.
//!
//! The finder ships as its own package. Its path comes from, in order:
//! 1. the configured override (`finder.path` / `STRATUM_FINDER_PATH`)
//! 2. the path an earlier deployment resolved
//! 3. a recursive search of the working directory for
//!    `{artifact_key}*.jar`
//!
//! Unlike the artifact scanner, the search does not skip hidden entries.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::builder::LayerBuilder;
use crate::domain::{Domain, Module};
use crate::error::{LayerError, LayerResult};
use crate::finder::{FinderCapability, ServiceFinder};
use crate::service::{Capability, ProviderScope};

/// Name of the domain the finder is deployed into.
pub const FINDER_DOMAIN: &str = "finder-layer";

/// Depth-first search below `dir` for the first `.jar` whose name starts
/// with `artifact_key`.
#[must_use]
pub fn find_finder_artifact(dir: &Path, artifact_key: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(artifact_key) && n.ends_with(".jar"))
        })
        .map(walkdir::DirEntry::into_path)
}

/// Locates and deploys the bootstrap finder.
#[derive(Debug)]
pub struct BootstrapLocator {
    override_path: Option<PathBuf>,
    artifact_key: String,
    search_root: PathBuf,
    resolved: RwLock<Option<PathBuf>>,
}

impl BootstrapLocator {
    /// Create a locator.
    #[must_use]
    pub fn new(
        override_path: Option<PathBuf>,
        artifact_key: impl Into<String>,
        search_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            override_path,
            artifact_key: artifact_key.into(),
            search_root: search_root.into(),
            resolved: RwLock::new(None),
        }
    }

    /// Create a locator from the `[finder]` config section.
    ///
    /// A relative `finder.path` is taken relative to `search_root`.
    #[must_use]
    pub fn from_config(section: &stratum_config::FinderSection, search_root: &Path) -> Self {
        Self::new(
            section.path.as_deref().map(|p| search_root.join(p)),
            section.artifact_key.clone(),
            search_root,
        )
    }

    /// Filename prefix searched for when no override is set.
    #[must_use]
    pub fn artifact_key(&self) -> &str {
        &self.artifact_key
    }

    /// Path remembered from an earlier successful search.
    #[must_use]
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.resolved
            .read()
            .unwrap_or_else(|e| {
                warn!("BootstrapLocator lock poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }

    /// Resolve the finder package path.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::FinderNotFound`] if no override is set and the
    /// search finds nothing.
    pub fn locate(&self) -> LayerResult<PathBuf> {
        if let Some(path) = &self.override_path {
            return Ok(path.clone());
        }
        if let Some(path) = self.resolved_path() {
            return Ok(path);
        }

        let found = find_finder_artifact(&self.search_root, &self.artifact_key).ok_or_else(|| {
            LayerError::FinderNotFound {
                key: self.artifact_key.clone(),
                searched: self.search_root.clone(),
            }
        })?;
        info!(path = %found.display(), "found bootstrap finder package");
        *self.resolved.write().unwrap_or_else(|e| {
            warn!("BootstrapLocator lock poisoned, recovering");
            e.into_inner()
        }) = Some(found.clone());
        Ok(found)
    }

    /// Build the finder domain over `parents` and instantiate its finder.
    ///
    /// The lookup covers the new domain only. Returns `Ok(None)` when the
    /// package provides no finder.
    ///
    /// # Errors
    ///
    /// Returns an error if the package cannot be located or resolved, or if
    /// the finder provider fails to instantiate.
    pub fn deploy(
        &self,
        builder: &LayerBuilder,
        parents: &[Arc<Domain>],
        caller: &Module,
    ) -> LayerResult<Option<Arc<dyn ServiceFinder>>> {
        let path = self.locate()?;
        let domain = builder.build(FINDER_DOMAIN, &[path], parents)?;

        let providers = domain.providers(caller, &FinderCapability::id(), ProviderScope::Local)?;
        let Some(provider) = providers.find_first() else {
            warn!(
                domain = %domain,
                "finder package provides no {}; capability lookups will fail",
                FinderCapability::ID
            );
            return Ok(None);
        };

        let finder = provider.get_as::<FinderCapability>()?;
        info!(
            domain = %domain.name(),
            finder = %provider.type_name(),
            parents = parents.len(),
            "deployed capability finder"
        );
        Ok(Some(finder))
    }
}
