//! The capability finder contract.
//!
//! The host cannot search plugin domains on its own: it lives in the boot
//! domain, which has no view of domains built later. A finder is deployed
//! into a domain parented on every live domain, so lookups issued through
//! it see the whole graph.

use std::sync::Arc;

use crate::domain::{Domain, Module, TypeHandle};
use crate::error::LayerResult;
use crate::service::{Capability, CapabilityId, ProviderSequence};

/// Capability id under which finders are provided.
pub const FINDER_CAPABILITY: &str = "stratum.layer.ServiceFinder";

/// Typed handle for [`FINDER_CAPABILITY`].
#[derive(Debug)]
pub struct FinderCapability;

impl Capability for FinderCapability {
    const ID: &'static str = FINDER_CAPABILITY;
    type Object = dyn ServiceFinder;
}

/// Cross-domain capability discovery.
pub trait ServiceFinder: Send + Sync {
    /// Domain the finder was deployed into.
    fn domain(&self) -> &Arc<Domain>;

    /// Module the finder belongs to.
    fn module(&self) -> &Arc<Module>;

    /// Declare that the finder's module will look up `capability`.
    ///
    /// Returns `true` only if the interest was newly added.
    fn ensure_uses(&self, capability: &CapabilityId) -> bool;

    /// Providers of `capability` across the finder's domain and ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery is refused for the capability.
    fn loader(&self, capability: &CapabilityId) -> LayerResult<ProviderSequence>;

    /// Resolve a type by fully qualified name from any visible domain.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::TypeNotFound`](crate::LayerError::TypeNotFound)
    /// once every visible domain has been probed.
    fn resolve_type(&self, name: &str) -> LayerResult<TypeHandle>;
}

impl std::fmt::Debug for dyn ServiceFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFinder")
            .field("domain", &self.domain().name())
            .field("module", &self.module().name())
            .finish_non_exhaustive()
    }
}
