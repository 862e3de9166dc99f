//! The plugin service finder.

use std::fmt;
use std::sync::{Arc, OnceLock};

use stratum_layer::{
    CapabilityId, Domain, HOST_MODULE, LISTENER_CAPABILITY, LayerError, LayerLifecycleListener,
    LayerResult, Module, ProviderContext, ProviderScope, ProviderSequence, ServiceFinder,
    TypeCatalog, TypeHandle, into_instance,
};
use tracing::{debug, trace};

/// Module name of the finder.
pub const FINDER_MODULE: &str = "stratum.finder";

/// Fully qualified type name of [`PluginServiceFinder`].
pub const FINDER_TYPE: &str = "stratum_finder::PluginServiceFinder";

/// Descriptor carried by the finder package.
///
/// The finder provides itself both as the service finder and as a
/// lifecycle listener.
pub const MODULE_DESCRIPTOR: &str = concat!(
    "[[module]]\n",
    "name = \"stratum.finder\"\n",
    "version = \"",
    env!("CARGO_PKG_VERSION"),
    "\"\n",
    "requires = [\"stratum.layer\"]\n",
    "exports = [\"stratum_finder::PluginServiceFinder\"]\n",
    "uses = [\"stratum.layer.LayerLifecycleListener\"]\n",
    "\n",
    "[[module.provides]]\n",
    "capability = \"stratum.layer.ServiceFinder\"\n",
    "with = [\"stratum_finder::PluginServiceFinder\"]\n",
    "\n",
    "[[module.provides]]\n",
    "capability = \"stratum.layer.LayerLifecycleListener\"\n",
    "with = [\"stratum_finder::PluginServiceFinder\"]\n",
);

/// Finds providers across the finder domain and every domain it descends
/// from.
///
/// The finder domain is parented on every domain live at deployment, so one
/// finder sees the whole registry of its generation. A rescan deploys a new
/// finder; this one keeps its domains alive until it is dropped.
pub struct PluginServiceFinder {
    domain: Arc<Domain>,
    module: Arc<Module>,
    probe: OnceLock<Vec<Arc<Domain>>>,
}

impl PluginServiceFinder {
    /// Create a finder for `module` in `domain`.
    #[must_use]
    pub fn new(domain: Arc<Domain>, module: Arc<Module>) -> Self {
        Self {
            domain,
            module,
            probe: OnceLock::new(),
        }
    }

    /// Create a finder for the module being instantiated.
    #[must_use]
    pub fn from_context(ctx: &ProviderContext<'_>) -> Self {
        Self::new(Arc::clone(ctx.domain), Arc::clone(ctx.module))
    }

    /// Domains `resolve_type` probes: the finder domain, then each parent.
    ///
    /// Built on first use and fixed for the finder's lifetime.
    pub fn probe_domains(&self) -> &[Arc<Domain>] {
        self.probe.get_or_init(|| {
            let mut domains = Vec::with_capacity(self.domain.parents().len().saturating_add(1));
            domains.push(Arc::clone(&self.domain));
            domains.extend(self.domain.parents().iter().cloned());
            debug!(
                domain = %self.domain.name(),
                probes = domains.len(),
                "built type probe list"
            );
            domains
        })
    }
}

impl ServiceFinder for PluginServiceFinder {
    fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    fn module(&self) -> &Arc<Module> {
        &self.module
    }

    fn ensure_uses(&self, capability: &CapabilityId) -> bool {
        self.module.ensure_uses(capability)
    }

    fn loader(&self, capability: &CapabilityId) -> LayerResult<ProviderSequence> {
        self.ensure_uses(capability);
        let providers =
            self.domain
                .providers(&self.module, capability, ProviderScope::WithAncestors)?;
        trace!(
            capability = %capability,
            providers = providers.len(),
            "finder lookup"
        );
        Ok(providers)
    }

    fn resolve_type(&self, name: &str) -> LayerResult<TypeHandle> {
        let domains = self.probe_domains();
        domains
            .iter()
            .find_map(|d| d.find_type(name))
            .ok_or_else(|| LayerError::TypeNotFound {
                name: name.to_string(),
                probed: domains.len(),
            })
    }
}

impl LayerLifecycleListener for PluginServiceFinder {
    fn layer_added(&self, name: &str, domain: &Arc<Domain>) {
        debug!(
            layer = %name,
            generation = domain.generation(),
            visible = self.domain.descends_from(domain),
            "finder observed layer added"
        );
    }

    fn layer_being_removed(&self, name: &str, domain: &Arc<Domain>) {
        debug!(
            layer = %name,
            generation = domain.generation(),
            "finder observed layer being removed"
        );
    }
}

impl fmt::Debug for PluginServiceFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginServiceFinder")
            .field("domain", &self.domain.name())
            .field("module", &self.module.name())
            .field("probes", &self.probe.get().map(Vec::len))
            .finish()
    }
}

/// Register the finder's code in `catalog`.
///
/// The instance is handed out as a lifecycle listener when requested for
/// that capability and as a service finder otherwise.
pub fn register(catalog: &TypeCatalog) {
    catalog.register_fn(FINDER_TYPE, |ctx| {
        if ctx.module.descriptor().requires.iter().all(|r| r != HOST_MODULE) {
            return Err(LayerError::Instantiation {
                type_name: ctx.type_name.to_string(),
                message: format!("declaring module must require {HOST_MODULE}"),
            });
        }
        let finder = Arc::new(PluginServiceFinder::from_context(ctx));
        match ctx.capability.map(CapabilityId::as_str) {
            Some(LISTENER_CAPABILITY) => Ok(into_instance::<dyn LayerLifecycleListener>(finder)),
            _ => Ok(into_instance::<dyn ServiceFinder>(finder)),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_layer::listener::register_builtin;
    use stratum_layer::{
        Capability, FINDER_CAPABILITY, FinderCapability, LayerBuilder, ListenerCapability,
        ModuleDescriptor, PackageDescriptor, host_module,
    };

    const GREETER: &str = "demo.Greeter";

    fn boot(catalog: &TypeCatalog) -> Arc<Domain> {
        Domain::boot(catalog.clone(), vec![host_module()])
    }

    fn finder_descriptor() -> Vec<ModuleDescriptor> {
        PackageDescriptor::parse(MODULE_DESCRIPTOR, std::path::Path::new("finder.jar"))
            .unwrap()
            .modules
    }

    /// boot <- plugins <- finder-layer
    fn deploy(catalog: &TypeCatalog) -> (Arc<Domain>, Arc<dyn ServiceFinder>) {
        let boot = boot(catalog);
        let builder = LayerBuilder::new(catalog.clone());
        let plugins = builder
            .build_from_descriptors(
                "plugins",
                vec![
                    ModuleDescriptor::new("demo.greeter")
                        .exports("demo::English")
                        .provides(GREETER, &["demo::English"]),
                ],
                std::slice::from_ref(&boot),
            )
            .unwrap();
        let finder_domain = builder
            .build_from_descriptors(
                "finder-layer",
                finder_descriptor(),
                &[boot, Arc::clone(&plugins)],
            )
            .unwrap();
        let host = finder_domain.find_module(HOST_MODULE).unwrap();
        let finder = finder_domain
            .providers(&host, &FinderCapability::id(), ProviderScope::Local)
            .unwrap()
            .find_first()
            .unwrap()
            .get_as::<FinderCapability>()
            .unwrap();
        (plugins, finder)
    }

    fn catalog() -> TypeCatalog {
        let catalog = TypeCatalog::new();
        register_builtin(&catalog);
        register(&catalog);
        catalog
    }

    #[test]
    fn descriptor_parses() {
        let modules = finder_descriptor();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, FINDER_MODULE);
        assert_eq!(modules[0].version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
        assert_eq!(modules[0].provides.len(), 2);
        assert!(modules[0].declares_type(FINDER_TYPE));
    }

    #[test]
    fn loader_sees_ancestor_providers_and_records_interest() {
        let (_plugins, finder) = deploy(&catalog());
        let cap = CapabilityId::from_static(GREETER);

        let seq = finder.loader(&cap).unwrap();
        assert_eq!(seq.type_names(), vec!["demo::English"]);
        assert_eq!(finder.module().interest().declared_count(), 1);

        assert!(!finder.ensure_uses(&cap));
        finder.loader(&cap).unwrap();
        assert_eq!(finder.module().interest().declared_count(), 1);
    }

    #[test]
    fn static_use_is_not_recorded() {
        let (_plugins, finder) = deploy(&catalog());
        let seq = finder
            .loader(&CapabilityId::from_static(LISTENER_CAPABILITY))
            .unwrap();
        assert_eq!(seq.len(), 2);
        let listener = CapabilityId::from_static(LISTENER_CAPABILITY);
        assert!(!finder.module().interest().contains(&listener));
    }

    #[test]
    fn finder_is_also_a_listener() {
        let (plugins, finder) = deploy(&catalog());
        let seq = finder
            .loader(&CapabilityId::from_static(LISTENER_CAPABILITY))
            .unwrap();
        let listeners: Vec<_> = seq
            .instances::<ListenerCapability>()
            .collect::<LayerResult<_>>()
            .unwrap();
        assert_eq!(listeners.len(), 2);
        for listener in &listeners {
            listener.layer_added("plugins", &plugins);
            listener.layer_being_removed("plugins", &plugins);
        }
    }

    #[test]
    fn resolve_type_probes_own_domain_and_parents() {
        let (plugins, finder) = deploy(&catalog());

        let handle = finder.resolve_type("demo::English").unwrap();
        assert_eq!(handle.domain().id(), plugins.id());

        let own = finder.resolve_type(FINDER_TYPE).unwrap();
        assert_eq!(own.domain().name(), "finder-layer");

        match finder.resolve_type("demo::Missing").unwrap_err() {
            LayerError::TypeNotFound { probed, .. } => assert_eq!(probed, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn instantiation_outside_host_graph_is_refused() {
        let catalog = catalog();
        let boot = Domain::boot(
            catalog.clone(),
            vec![
                ModuleDescriptor::new("rogue")
                    .uses(FINDER_CAPABILITY)
                    .provides(FINDER_CAPABILITY, &[FINDER_TYPE]),
            ],
        );
        let rogue = boot.module("rogue").unwrap();
        let err = boot
            .providers(
                rogue,
                &CapabilityId::from_static(FINDER_CAPABILITY),
                ProviderScope::Local,
            )
            .unwrap()
            .find_first()
            .unwrap()
            .get()
            .unwrap_err();
        assert!(matches!(err, LayerError::Instantiation { .. }));
    }
}
