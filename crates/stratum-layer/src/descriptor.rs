//! Module descriptors carried inside plugin packages.
//!
//! A package declares its modules in a `Module.toml` at the archive root:
//!
//! ```toml
//! [[module]]
//! name = "demo.greeter"
//! version = "1.0.0"
//! requires = ["demo.api"]
//! exports = ["demo_greeter::Greeting"]
//! uses = ["demo.api.Clock"]
//!
//! [[module.provides]]
//! capability = "demo.api.Greeter"
//! with = ["demo_greeter::EnglishGreeter", "demo_greeter::FrenchGreeter"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};
use crate::service::CapabilityId;

/// Descriptor file name looked up at the root of every package.
pub const DESCRIPTOR_FILE_NAME: &str = "Module.toml";

/// Parsed contents of a `Module.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Modules declared by the package.
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleDescriptor>,
}

/// One module within a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module name, unique within a domain.
    pub name: String,
    /// Optional module version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Modules that must be resolvable from the same build or an ancestor.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Type names other code may resolve by name.
    #[serde(default)]
    pub exports: Vec<String>,
    /// Capabilities this module statically declares it will look up.
    #[serde(default)]
    pub uses: Vec<String>,
    /// Capability implementations supplied by this module.
    #[serde(default)]
    pub provides: Vec<ProvidesDescriptor>,
    /// Set for modules synthesized from packages without a descriptor.
    #[serde(skip)]
    pub automatic: bool,
}

/// A `[[module.provides]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidesDescriptor {
    /// Capability identifier.
    pub capability: String,
    /// Implementation type names, in lookup order.
    pub with: Vec<String>,
}

impl PackageDescriptor {
    /// Parse and validate a descriptor read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::InvalidPackage`] if the TOML is malformed or a
    /// module is incomplete.
    pub fn parse(content: &str, path: &Path) -> LayerResult<Self> {
        let descriptor: Self = toml::from_str(content).map_err(|e| LayerError::InvalidPackage {
            path: path.to_path_buf(),
            message: format!("{DESCRIPTOR_FILE_NAME}: {e}"),
        })?;
        descriptor.validate(path)?;
        Ok(descriptor)
    }

    fn validate(&self, path: &Path) -> LayerResult<()> {
        let invalid = |message: String| LayerError::InvalidPackage {
            path: path.to_path_buf(),
            message,
        };

        if self.modules.is_empty() {
            return Err(invalid(format!(
                "{DESCRIPTOR_FILE_NAME} declares no [[module]] tables"
            )));
        }
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(invalid("module name must not be empty".into()));
            }
            for cap in module
                .uses
                .iter()
                .chain(module.provides.iter().map(|p| &p.capability))
            {
                if !CapabilityId::is_valid(cap) {
                    return Err(invalid(format!(
                        "module '{}' names invalid capability '{cap}'",
                        module.name
                    )));
                }
            }
            if let Some(p) = module.provides.iter().find(|p| p.with.is_empty()) {
                return Err(invalid(format!(
                    "module '{}' provides '{}' without implementations",
                    module.name, p.capability
                )));
            }
        }
        Ok(())
    }
}

impl ModuleDescriptor {
    /// Create an empty explicit module descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Descriptor for a package that carries no `Module.toml`.
    ///
    /// Automatic modules may look up any capability and export nothing.
    #[must_use]
    pub fn automatic(name: impl Into<String>) -> Self {
        Self {
            automatic: true,
            ..Self::new(name)
        }
    }

    /// Add a required module.
    #[must_use]
    pub fn requires(mut self, module: impl Into<String>) -> Self {
        self.requires.push(module.into());
        self
    }

    /// Add an exported type.
    #[must_use]
    pub fn exports(mut self, type_name: impl Into<String>) -> Self {
        self.exports.push(type_name.into());
        self
    }

    /// Add a statically used capability.
    #[must_use]
    pub fn uses(mut self, capability: impl Into<String>) -> Self {
        self.uses.push(capability.into());
        self
    }

    /// Add a capability implementation.
    #[must_use]
    pub fn provides(mut self, capability: impl Into<String>, with: &[&str]) -> Self {
        self.provides.push(ProvidesDescriptor {
            capability: capability.into(),
            with: with.iter().map(|s| (*s).to_string()).collect(),
        });
        self
    }

    /// Implementation types this module supplies for `capability`.
    pub fn providers_of<'a>(&'a self, capability: &'a str) -> impl Iterator<Item = &'a str> {
        self.provides
            .iter()
            .filter(move |p| p.capability == capability)
            .flat_map(|p| p.with.iter().map(String::as_str))
    }

    /// Whether `type_name` belongs to this module, either exported or named
    /// as a capability implementation.
    #[must_use]
    pub fn declares_type(&self, type_name: &str) -> bool {
        self.exports.iter().any(|t| t == type_name)
            || self
                .provides
                .iter()
                .any(|p| p.with.iter().any(|t| t == type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETER: &str = r#"
[[module]]
name = "demo.greeter"
version = "1.0.0"
requires = ["demo.api"]
exports = ["demo_greeter::Greeting"]

[[module.provides]]
capability = "demo.api.Greeter"
with = ["demo_greeter::EnglishGreeter", "demo_greeter::FrenchGreeter"]
"#;

    #[test]
    fn parses_full_descriptor() {
        let d = PackageDescriptor::parse(GREETER, Path::new("greeter-1.0.jar")).unwrap();
        assert_eq!(d.modules.len(), 1);
        let m = &d.modules[0];
        assert_eq!(m.name, "demo.greeter");
        assert_eq!(m.version.as_deref(), Some("1.0.0"));
        assert_eq!(m.requires, vec!["demo.api".to_string()]);
        assert!(!m.automatic);
        let impls: Vec<_> = m.providers_of("demo.api.Greeter").collect();
        assert_eq!(
            impls,
            vec!["demo_greeter::EnglishGreeter", "demo_greeter::FrenchGreeter"]
        );
    }

    #[test]
    fn declares_exports_and_implementations() {
        let d = PackageDescriptor::parse(GREETER, Path::new("g.jar")).unwrap();
        let m = &d.modules[0];
        assert!(m.declares_type("demo_greeter::Greeting"));
        assert!(m.declares_type("demo_greeter::FrenchGreeter"));
        assert!(!m.declares_type("demo_greeter::Missing"));
    }

    #[test]
    fn rejects_empty_descriptor() {
        let err = PackageDescriptor::parse("", Path::new("empty.jar")).unwrap_err();
        assert!(matches!(err, LayerError::InvalidPackage { .. }));
    }

    #[test]
    fn rejects_invalid_capability() {
        let content = r#"
[[module]]
name = "bad"
uses = ["not a capability"]
"#;
        assert!(PackageDescriptor::parse(content, Path::new("bad.jar")).is_err());
    }

    #[test]
    fn rejects_provides_without_types() {
        let content = r#"
[[module]]
name = "bad"

[[module.provides]]
capability = "demo.api.Greeter"
with = []
"#;
        assert!(PackageDescriptor::parse(content, Path::new("bad.jar")).is_err());
    }

    #[test]
    fn builder_methods() {
        let m = ModuleDescriptor::new("demo.api")
            .exports("demo_api::Greeting")
            .uses("demo.api.Clock")
            .provides("demo.api.Greeter", &["demo_api::Default"]);
        assert_eq!(m.exports.len(), 1);
        assert_eq!(m.uses, vec!["demo.api.Clock".to_string()]);
        assert!(m.declares_type("demo_api::Default"));
        assert!(ModuleDescriptor::automatic("x").automatic);
    }
}
