//! Capabilities, providers and lazy provider sequences.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::catalog::{Instance, ProviderContext};
use crate::domain::{Domain, Module};
use crate::error::{LayerError, LayerResult};

/// Identifier of a capability interface, e.g. `stratum.layer.ServiceFinder`.
///
/// Dot-separated segments of ASCII alphanumerics and underscores; no segment
/// may be empty or start with a digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CapabilityId(String);

impl<'de> Deserialize<'de> for CapabilityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl CapabilityId {
    /// Create a capability id, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::InvalidId`] if the id is malformed.
    pub fn new(id: impl Into<String>) -> LayerResult<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Create a capability id without validation (for constants and tests).
    #[must_use]
    pub fn from_static(id: &'static str) -> Self {
        Self(id.to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a string is a valid capability id.
    #[must_use]
    pub fn is_valid(id: &str) -> bool {
        Self::validate(id).is_ok()
    }

    fn validate(id: &str) -> LayerResult<()> {
        if id.is_empty() {
            return Err(LayerError::InvalidId(
                "capability id must not be empty".into(),
            ));
        }
        for segment in id.split('.') {
            let mut chars = segment.chars();
            let Some(first) = chars.next() else {
                return Err(LayerError::InvalidId(format!(
                    "capability id has an empty segment: {id}"
                )));
            };
            if first.is_ascii_digit() {
                return Err(LayerError::InvalidId(format!(
                    "capability id segment must not start with a digit: {id}"
                )));
            }
            if !std::iter::once(first)
                .chain(chars)
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(LayerError::InvalidId(format!(
                    "capability id must contain only alphanumerics, underscores and dots, got: {id}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CapabilityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CapabilityId {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A capability interface known at compile time.
///
/// Ties a [`CapabilityId`] to the trait object providers are recovered as.
/// Providers register instances built with
/// [`into_instance`](crate::catalog::into_instance) for `Object`.
pub trait Capability: 'static {
    /// Capability identifier.
    const ID: &'static str;
    /// Trait object type providers implement.
    type Object: ?Sized + Send + Sync + 'static;

    /// The identifier as a [`CapabilityId`].
    #[must_use]
    fn id() -> CapabilityId {
        CapabilityId::from_static(Self::ID)
    }
}

/// Where to look for providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderScope {
    /// Only the domain the lookup is issued against.
    Local,
    /// The domain and all of its ancestors, depth-first.
    WithAncestors,
}

/// One implementation of a capability, instantiated on first access.
pub struct Provider {
    domain: Arc<Domain>,
    module: Arc<Module>,
    capability: CapabilityId,
    type_name: String,
    instance: OnceLock<Instance>,
}

impl Provider {
    pub(crate) fn new(
        domain: Arc<Domain>,
        module: Arc<Module>,
        capability: CapabilityId,
        type_name: String,
    ) -> Self {
        Self {
            domain,
            module,
            capability,
            type_name,
            instance: OnceLock::new(),
        }
    }

    /// Implementation type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Capability this provider implements.
    #[must_use]
    pub fn capability(&self) -> &CapabilityId {
        &self.capability
    }

    /// Module that declares the implementation.
    #[must_use]
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Domain the implementation was found in.
    #[must_use]
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// Whether the provider has been instantiated.
    #[must_use]
    pub fn is_instantiated(&self) -> bool {
        self.instance.get().is_some()
    }

    /// Get the provider instance, creating it on first call.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Instantiation`] if no code is registered for the
    /// type or its factory fails.
    pub fn get(&self) -> LayerResult<Instance> {
        if let Some(instance) = self.instance.get() {
            return Ok(Arc::clone(instance));
        }
        let factory = self.domain.catalog().factory(&self.type_name).ok_or_else(|| {
            LayerError::Instantiation {
                type_name: self.type_name.clone(),
                message: "no code registered for this type".into(),
            }
        })?;
        let created = factory.create(&ProviderContext {
            domain: &self.domain,
            module: &self.module,
            type_name: &self.type_name,
            capability: Some(&self.capability),
        })?;
        Ok(Arc::clone(self.instance.get_or_init(|| created)))
    }

    /// Get the provider instance as `C`'s trait object.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Instantiation`] if creation fails or the
    /// instance does not implement `C`.
    pub fn get_as<C: Capability>(&self) -> LayerResult<Arc<C::Object>> {
        let instance = self.get()?;
        instance
            .downcast_ref::<Arc<C::Object>>()
            .cloned()
            .ok_or_else(|| LayerError::Instantiation {
                type_name: self.type_name.clone(),
                message: format!("instance does not implement {}", C::ID),
            })
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("capability", &self.capability)
            .field("type_name", &self.type_name)
            .field("module", &self.module.name())
            .field("domain", &self.domain.name())
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}

/// The providers of one capability, in discovery order.
///
/// Discovery fixes which implementations exist; none are instantiated until
/// asked for. The sequence can be iterated any number of times and each
/// provider keeps the instance it created.
#[derive(Debug, Clone, Default)]
pub struct ProviderSequence {
    capability: Option<CapabilityId>,
    providers: Vec<Arc<Provider>>,
}

impl ProviderSequence {
    pub(crate) fn new(capability: CapabilityId, providers: Vec<Arc<Provider>>) -> Self {
        Self {
            capability: Some(capability),
            providers,
        }
    }

    /// The capability looked up, if any.
    #[must_use]
    pub fn capability(&self) -> Option<&CapabilityId> {
        self.capability.as_ref()
    }

    /// Iterate the providers from the start.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers.iter()
    }

    /// Iterate typed instances, creating each on demand.
    pub fn instances<C: Capability>(&self) -> impl Iterator<Item = LayerResult<Arc<C::Object>>> {
        self.providers.iter().map(|p| p.get_as::<C>())
    }

    /// The first provider, if any.
    #[must_use]
    pub fn find_first(&self) -> Option<Arc<Provider>> {
        self.providers.first().cloned()
    }

    /// Implementation type names, in discovery order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.type_name()).collect()
    }

    /// Number of providers found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProviderSequence {
    type Item = &'a Arc<Provider>;
    type IntoIter = std::slice::Iter<'a, Arc<Provider>>;

    fn into_iter(self) -> Self::IntoIter {
        self.providers.iter()
    }
}
