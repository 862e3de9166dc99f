//! Domains: isolated, immutable sets of resolved modules.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;
use uuid::Uuid;

use crate::catalog::{Instance, ProviderContext, TypeCatalog};
use crate::descriptor::ModuleDescriptor;
use crate::error::{LayerError, LayerResult};
use crate::service::{CapabilityId, Provider, ProviderScope, ProviderSequence};

/// Name of the boot domain.
pub const BOOT_DOMAIN: &str = "boot-layer";

/// Capabilities a module has declared interest in at runtime.
///
/// Append-only and idempotent. Static `uses` entries from the descriptor are
/// not recorded here.
#[derive(Debug, Default)]
pub struct CapabilityInterestRecord {
    declared: DashSet<CapabilityId>,
}

impl CapabilityInterestRecord {
    /// Record interest. Returns `true` if it was not already recorded.
    pub fn add(&self, capability: &CapabilityId) -> bool {
        self.declared.insert(capability.clone())
    }

    /// Whether interest in `capability` has been recorded.
    #[must_use]
    pub fn contains(&self, capability: &CapabilityId) -> bool {
        self.declared.contains(capability)
    }

    /// Number of capabilities declared at runtime.
    #[must_use]
    pub fn declared_count(&self) -> usize {
        self.declared.len()
    }

    /// Declared capabilities, sorted.
    #[must_use]
    pub fn declared(&self) -> Vec<CapabilityId> {
        let mut ids: Vec<CapabilityId> = self.declared.iter().map(|c| c.key().clone()).collect();
        ids.sort();
        ids
    }
}

/// A resolved module inside a domain.
#[derive(Debug)]
pub struct Module {
    descriptor: ModuleDescriptor,
    domain: String,
    interest: CapabilityInterestRecord,
}

impl Module {
    fn new(descriptor: ModuleDescriptor, domain: &str) -> Self {
        Self {
            descriptor,
            domain: domain.to_string(),
            interest: CapabilityInterestRecord::default(),
        }
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Name of the owning domain.
    #[must_use]
    pub fn domain_name(&self) -> &str {
        &self.domain
    }

    /// The descriptor this module was resolved from.
    #[must_use]
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Whether this module was synthesized for a descriptor-less package.
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.descriptor.automatic
    }

    /// Runtime interest record.
    #[must_use]
    pub fn interest(&self) -> &CapabilityInterestRecord {
        &self.interest
    }

    /// Whether this module may look up `capability`.
    #[must_use]
    pub fn can_use(&self, capability: &CapabilityId) -> bool {
        self.descriptor.automatic
            || self.descriptor.uses.iter().any(|u| u == capability.as_str())
            || self.interest.contains(capability)
    }

    /// Declare interest in `capability` if the module cannot already use it.
    ///
    /// Returns `true` only when the interest was newly added.
    pub fn ensure_uses(&self, capability: &CapabilityId) -> bool {
        if self.can_use(capability) {
            return false;
        }
        self.interest.add(capability)
    }
}

/// A resolved type and where it lives.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    name: String,
    module: Arc<Module>,
    domain: Arc<Domain>,
}

impl TypeHandle {
    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring module.
    #[must_use]
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Owning domain.
    #[must_use]
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// Create a fresh instance of the type.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Instantiation`] if no code is registered for
    /// the type or its factory fails.
    pub fn instantiate(&self) -> LayerResult<Instance> {
        let factory = self.domain.catalog().factory(&self.name).ok_or_else(|| {
            LayerError::Instantiation {
                type_name: self.name.clone(),
                message: "no code registered for this type".into(),
            }
        })?;
        factory.create(&ProviderContext {
            domain: &self.domain,
            module: &self.module,
            type_name: &self.name,
            capability: None,
        })
    }
}

/// An isolated code-loading context.
///
/// Built once by the [`LayerBuilder`](crate::LayerBuilder) and never mutated.
/// Every module in a domain shares the domain's catalog. Dropping the last
/// `Arc` releases the domain and its modules.
pub struct Domain {
    id: Uuid,
    name: String,
    generation: u64,
    parents: Vec<Arc<Domain>>,
    modules: Vec<Arc<Module>>,
    catalog: TypeCatalog,
}

impl Domain {
    /// Create the boot domain holding the host's own modules.
    #[must_use]
    pub fn boot(catalog: TypeCatalog, modules: Vec<ModuleDescriptor>) -> Arc<Self> {
        Self::new(BOOT_DOMAIN, 0, Vec::new(), modules, catalog)
    }

    pub(crate) fn new(
        name: &str,
        generation: u64,
        parents: Vec<Arc<Domain>>,
        modules: Vec<ModuleDescriptor>,
        catalog: TypeCatalog,
    ) -> Arc<Self> {
        let modules = modules
            .into_iter()
            .map(|d| Arc::new(Module::new(d, name)))
            .collect();
        Arc::new(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            generation,
            parents,
            modules,
            catalog,
        })
    }

    /// Unique id of this domain instance.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rescan generation that built this domain (0 for boot).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Direct parent domains.
    #[must_use]
    pub fn parents(&self) -> &[Arc<Domain>] {
        &self.parents
    }

    /// Modules resolved into this domain.
    #[must_use]
    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    /// The shared code catalog.
    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Whether this is a root domain (no parents).
    #[must_use]
    pub fn is_boot(&self) -> bool {
        self.parents.is_empty()
    }

    /// Look up a module in this domain only.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Arc<Module>> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// This domain followed by its ancestors, depth-first, each once.
    #[must_use]
    pub fn ancestors(self: &Arc<Self>) -> Vec<Arc<Domain>> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut stack = vec![Arc::clone(self)];
        while let Some(domain) = stack.pop() {
            if !seen.insert(domain.id) {
                continue;
            }
            for parent in domain.parents.iter().rev() {
                stack.push(Arc::clone(parent));
            }
            ordered.push(domain);
        }
        ordered
    }

    /// Whether `other` is this domain or one of its ancestors.
    #[must_use]
    pub fn descends_from(self: &Arc<Self>, other: &Domain) -> bool {
        self.ancestors().iter().any(|d| d.id == other.id)
    }

    /// Find a module by name in this domain or any ancestor.
    #[must_use]
    pub fn find_module(self: &Arc<Self>, name: &str) -> Option<Arc<Module>> {
        self.ancestors()
            .iter()
            .find_map(|d| d.module(name).cloned())
    }

    /// Resolve a type declared by one of this domain's own modules.
    #[must_use]
    pub fn find_type(self: &Arc<Self>, name: &str) -> Option<TypeHandle> {
        self.modules
            .iter()
            .find(|m| m.descriptor().declares_type(name))
            .map(|m| TypeHandle {
                name: name.to_string(),
                module: Arc::clone(m),
                domain: Arc::clone(self),
            })
    }

    /// Discover providers of `capability` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::UndeclaredInterest`] if `caller` has neither a
    /// static `uses` entry nor recorded interest for the capability.
    pub fn providers(
        self: &Arc<Self>,
        caller: &Module,
        capability: &CapabilityId,
        scope: ProviderScope,
    ) -> LayerResult<ProviderSequence> {
        if !caller.can_use(capability) {
            return Err(LayerError::UndeclaredInterest {
                module: caller.name().to_string(),
                capability: capability.to_string(),
            });
        }

        let domains = match scope {
            ProviderScope::Local => vec![Arc::clone(self)],
            ProviderScope::WithAncestors => self.ancestors(),
        };

        let mut providers = Vec::new();
        for domain in &domains {
            for module in domain.modules() {
                for type_name in module.descriptor().providers_of(capability.as_str()) {
                    providers.push(Arc::new(Provider::new(
                        Arc::clone(domain),
                        Arc::clone(module),
                        capability.clone(),
                        type_name.to_string(),
                    )));
                }
            }
        }
        Ok(ProviderSequence::new(capability.clone(), providers))
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("generation", &self.generation)
            .field(
                "parents",
                &self.parents.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (generation {}, {} modules)",
            self.name,
            self.generation,
            self.modules.len()
        )
    }
}
