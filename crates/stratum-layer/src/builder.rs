//! Layer builder: resolve packages into one new domain.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::TypeCatalog;
use crate::descriptor::ModuleDescriptor;
use crate::domain::Domain;
use crate::error::{LayerError, LayerResult};
use crate::package::Package;

/// Resolves module graphs into domains.
///
/// A build either yields exactly one fully-resolved domain or fails; no
/// partially linked domain is ever returned.
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    catalog: TypeCatalog,
    generation: u64,
}

impl LayerBuilder {
    /// Create a builder that links domains against `catalog`.
    #[must_use]
    pub fn new(catalog: TypeCatalog) -> Self {
        Self {
            catalog,
            generation: 0,
        }
    }

    /// Stamp built domains with a rescan generation.
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Generation stamped on built domains.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Read `packages` and resolve them into a domain named `name`.
    ///
    /// Every module found becomes a root of the resolution.
    ///
    /// # Errors
    ///
    /// Returns the first package read error, [`LayerError::DuplicateModule`]
    /// if two packages declare the same module, or
    /// [`LayerError::Resolution`] if a required module is available neither
    /// from the packages nor from any ancestor of `parents`.
    pub fn build(
        &self,
        name: &str,
        packages: &[PathBuf],
        parents: &[Arc<Domain>],
    ) -> LayerResult<Arc<Domain>> {
        let mut modules = Vec::new();
        for path in packages {
            let package = Package::read(path)?;
            debug!(
                path = %path.display(),
                modules = package.descriptor.modules.len(),
                "read package"
            );
            modules.extend(package.descriptor.modules);
        }
        self.build_from_descriptors(name, modules, parents)
    }

    /// Resolve already-parsed module descriptors into a domain.
    ///
    /// # Errors
    ///
    /// See [`LayerBuilder::build`].
    pub fn build_from_descriptors(
        &self,
        name: &str,
        modules: Vec<ModuleDescriptor>,
        parents: &[Arc<Domain>],
    ) -> LayerResult<Arc<Domain>> {
        let mut names = HashSet::new();
        for module in &modules {
            if !names.insert(module.name.as_str()) {
                return Err(LayerError::DuplicateModule(module.name.clone()));
            }
        }

        let ancestors: Vec<Arc<Domain>> = {
            let mut seen = HashSet::new();
            parents
                .iter()
                .flat_map(Domain::ancestors)
                .filter(|d| seen.insert(d.id()))
                .collect()
        };
        let available = |required: &str| {
            names.contains(required) || ancestors.iter().any(|d| d.module(required).is_some())
        };

        for module in &modules {
            if let Some(missing) = module.requires.iter().find(|r| !available(r.as_str())) {
                return Err(LayerError::Resolution {
                    module: module.name.clone(),
                    requires: missing.clone(),
                });
            }
        }

        let domain = Domain::new(
            name,
            self.generation,
            parents.to_vec(),
            modules,
            self.catalog.clone(),
        );
        info!(
            domain = %domain.name(),
            id = %domain.id(),
            generation = domain.generation(),
            modules = domain.modules().len(),
            parents = parents.len(),
            "built domain"
        );
        Ok(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_test::PackageFixture;

    fn boot() -> Arc<Domain> {
        Domain::boot(
            TypeCatalog::new(),
            vec![ModuleDescriptor::new("stratum.layer")],
        )
    }

    #[test]
    fn resolves_within_new_set_and_parents() {
        let boot = boot();
        let builder = LayerBuilder::new(TypeCatalog::new()).with_generation(3);
        let domain = builder
            .build_from_descriptors(
                "plugins",
                vec![
                    ModuleDescriptor::new("demo.impl")
                        .requires("demo.api")
                        .requires("stratum.layer"),
                    ModuleDescriptor::new("demo.api"),
                ],
                &[Arc::clone(&boot)],
            )
            .unwrap();

        assert_eq!(domain.name(), "plugins");
        assert_eq!(domain.generation(), 3);
        assert_eq!(domain.modules().len(), 2);
        assert!(domain.descends_from(&boot));
    }

    #[test]
    fn missing_requirement_fails_whole_build() {
        let err = LayerBuilder::new(TypeCatalog::new())
            .build_from_descriptors(
                "plugins",
                vec![
                    ModuleDescriptor::new("demo.ok"),
                    ModuleDescriptor::new("demo.impl").requires("demo.missing"),
                ],
                &[boot()],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LayerError::Resolution { ref module, ref requires }
                if module == "demo.impl" && requires == "demo.missing"
        ));
    }

    #[test]
    fn duplicate_modules_rejected() {
        let err = LayerBuilder::new(TypeCatalog::new())
            .build_from_descriptors(
                "plugins",
                vec![ModuleDescriptor::new("demo"), ModuleDescriptor::new("demo")],
                &[boot()],
            )
            .unwrap_err();
        assert!(matches!(err, LayerError::DuplicateModule(ref m) if m == "demo"));
    }

    #[test]
    fn requirement_satisfied_by_grandparent() {
        let boot = boot();
        let builder = LayerBuilder::new(TypeCatalog::new());
        let middle = builder
            .build_from_descriptors(
                "middle",
                vec![ModuleDescriptor::new("demo.api")],
                &[Arc::clone(&boot)],
            )
            .unwrap();
        let top = builder.build_from_descriptors(
            "top",
            vec![
                ModuleDescriptor::new("demo.impl")
                    .requires("demo.api")
                    .requires("stratum.layer"),
            ],
            &[middle],
        );
        assert!(top.is_ok());
    }

    #[test]
    fn builds_from_package_files() {
        let tmp = tempfile::tempdir().unwrap();
        let api = PackageFixture::new("api-1.0.jar")
            .descriptor("[[module]]\nname = \"demo.api\"\n")
            .write_to(tmp.path())
            .unwrap();
        let legacy = PackageFixture::new("legacy-2.0.zip")
            .write_to(tmp.path())
            .unwrap();

        let domain = LayerBuilder::new(TypeCatalog::new())
            .build("plugins", &[api, legacy], &[boot()])
            .unwrap();
        let names: Vec<&str> = domain.modules().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["demo.api", "legacy"]);
        assert!(domain.module("legacy").unwrap().is_automatic());
    }
}
