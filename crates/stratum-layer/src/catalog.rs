//! Type catalog: the code behind declared type names.
//!
//! Packages only describe modules. The code those modules name is linked
//! into the host and registered here as factories keyed by fully qualified
//! type name. A domain can only instantiate a type one of its own modules
//! declares, so the catalog supplies code without granting visibility.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::{Domain, Module};
use crate::error::LayerResult;
use crate::service::CapabilityId;

/// A type-erased, shareable instance produced by a [`Factory`].
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wrap a trait object so it can be recovered from an [`Instance`] by
/// downcasting to `Arc<T>`.
pub fn into_instance<T: ?Sized + Send + Sync + 'static>(object: Arc<T>) -> Instance {
    Arc::new(object)
}

/// Where an instance is being created.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    /// Domain that owns the declaring module.
    pub domain: &'a Arc<Domain>,
    /// Module that declares the type.
    pub module: &'a Arc<Module>,
    /// The type being instantiated.
    pub type_name: &'a str,
    /// Capability the instance is requested as, if any.
    pub capability: Option<&'a CapabilityId>,
}

/// Creates instances of one type.
pub trait Factory: Send + Sync {
    /// Create a new instance.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Instantiation`](crate::LayerError::Instantiation)
    /// if the type cannot be created in this context.
    fn create(&self, ctx: &ProviderContext<'_>) -> LayerResult<Instance>;
}

impl<F> Factory for F
where
    F: Fn(&ProviderContext<'_>) -> LayerResult<Instance> + Send + Sync,
{
    fn create(&self, ctx: &ProviderContext<'_>) -> LayerResult<Instance> {
        self(ctx)
    }
}

/// Shared registry of type factories.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone, Default)]
pub struct TypeCatalog {
    factories: Arc<DashMap<String, Arc<dyn Factory>>>,
}

impl TypeCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the same name.
    pub fn register(&self, type_name: impl Into<String>, factory: impl Factory + 'static) {
        self.factories.insert(type_name.into(), Arc::new(factory));
    }

    /// Register a closure as the factory for a type.
    pub fn register_fn<F>(&self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderContext<'_>) -> LayerResult<Instance> + Send + Sync + 'static,
    {
        self.register(type_name, factory);
    }

    /// Look up the factory for a type.
    #[must_use]
    pub fn factory(&self, type_name: &str) -> Option<Arc<dyn Factory>> {
        self.factories.get(type_name).map(|f| Arc::clone(f.value()))
    }

    /// Whether code is registered for a type.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("types", &self.factories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let catalog = TypeCatalog::new();
        assert!(catalog.is_empty());
        catalog.register_fn("demo::Thing", |_| Ok(Arc::new(7_u32) as Instance));
        assert!(catalog.contains("demo::Thing"));
        assert!(catalog.factory("demo::Other").is_none());
        assert_eq!(catalog.type_names(), vec!["demo::Thing".to_string()]);
    }

    #[test]
    fn clones_share_registrations() {
        let catalog = TypeCatalog::new();
        let clone = catalog.clone();
        clone.register_fn("demo::Thing", |_| Ok(Arc::new(()) as Instance));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn trait_objects_round_trip_through_instance() {
        trait Speak: Send + Sync {
            fn word(&self) -> &'static str;
        }
        struct Dog;
        impl Speak for Dog {
            fn word(&self) -> &'static str {
                "woof"
            }
        }

        let instance = into_instance::<dyn Speak>(Arc::new(Dog));
        let speaker = instance.downcast_ref::<Arc<dyn Speak>>().unwrap();
        assert_eq!(speaker.word(), "woof");
    }
}
