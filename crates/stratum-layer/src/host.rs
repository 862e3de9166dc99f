//! Host context and service manager.
//!
//! [`StratumHost`] owns the boot domain, the type catalog and the loaded
//! configuration. It accepts a watch directory exactly once; that call scans,
//! builds the plugin layer, deploys the finder and hands back the
//! [`ServiceManager`] every consumer shares.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use stratum_config::Config;
use tracing::{debug, info, warn};

use crate::bootstrap::BootstrapLocator;
use crate::builder::LayerBuilder;
use crate::catalog::TypeCatalog;
use crate::descriptor::ModuleDescriptor;
use crate::domain::{Domain, Module, TypeHandle};
use crate::error::{LayerError, LayerResult};
use crate::finder::{FINDER_CAPABILITY, ServiceFinder};
use crate::listener::{
    LISTENER_CAPABILITY, LOGGING_LISTENER_TYPE, LayerLifecycleListener, ListenerCapability,
    register_builtin,
};
use crate::naming::plugin_name;
use crate::registry::LayerRegistry;
use crate::scanner::{ScanOptions, scan_artifacts};
use crate::service::{Capability, CapabilityId, ProviderSequence};
use crate::watch::WatchDirectory;

/// Name of the host's own module in the boot domain.
pub const HOST_MODULE: &str = "stratum.layer";

/// Descriptor of the host module.
///
/// It statically uses the finder and listener capabilities and provides the
/// logging listener.
#[must_use]
pub fn host_module() -> ModuleDescriptor {
    ModuleDescriptor::new(HOST_MODULE)
        .uses(FINDER_CAPABILITY)
        .uses(LISTENER_CAPABILITY)
        .provides(LISTENER_CAPABILITY, &[LOGGING_LISTENER_TYPE])
}

/// Builder for [`StratumHost`].
#[derive(Debug)]
pub struct HostBuilder {
    working_dir: PathBuf,
    config: Config,
    catalog: TypeCatalog,
    boot_modules: Vec<ModuleDescriptor>,
}

impl HostBuilder {
    /// Use this configuration instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use this catalog. Code for plugin types must be registered in it.
    #[must_use]
    pub fn catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Add a module to the boot domain alongside the host module.
    #[must_use]
    pub fn boot_module(mut self, module: ModuleDescriptor) -> Self {
        self.boot_modules.push(module);
        self
    }

    /// Build the host.
    #[must_use]
    pub fn build(self) -> StratumHost {
        register_builtin(&self.catalog);
        let mut modules = vec![host_module()];
        modules.extend(self.boot_modules);
        let boot = Domain::boot(self.catalog.clone(), modules);
        debug!(boot = %boot, "created boot domain");
        StratumHost {
            boot,
            catalog: self.catalog,
            config: self.config,
            working_dir: self.working_dir,
            initialized: AtomicBool::new(false),
            manager: OnceLock::new(),
        }
    }
}

/// Process-level context for plugin loading.
#[derive(Debug)]
pub struct StratumHost {
    boot: Arc<Domain>,
    catalog: TypeCatalog,
    config: Config,
    working_dir: PathBuf,
    initialized: AtomicBool,
    manager: OnceLock<Arc<ServiceManager>>,
}

impl StratumHost {
    /// Start building a host rooted at `working_dir`.
    #[must_use]
    pub fn builder(working_dir: impl Into<PathBuf>) -> HostBuilder {
        HostBuilder {
            working_dir: working_dir.into(),
            config: Config::default(),
            catalog: TypeCatalog::new(),
            boot_modules: Vec::new(),
        }
    }

    /// Build a host with configuration loaded for `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Config`] if configuration fails to load.
    pub fn load(working_dir: &Path, catalog: TypeCatalog) -> LayerResult<Self> {
        let resolved = Config::load(Some(working_dir))?;
        Ok(Self::builder(working_dir)
            .config(resolved.config)
            .catalog(catalog)
            .build())
    }

    /// The boot domain.
    #[must_use]
    pub fn boot(&self) -> &Arc<Domain> {
        &self.boot
    }

    /// The shared type catalog.
    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// The configuration the host was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Working directory used for the standard plugins directory and the
    /// finder search.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The service manager, once initialized.
    #[must_use]
    pub fn manager(&self) -> Option<Arc<ServiceManager>> {
        self.manager.get().cloned()
    }

    /// The watch directory named by `[plugins]`, or the standard one.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Io`] if the standard directory cannot be created.
    pub fn configured_watch_directory(&self) -> LayerResult<WatchDirectory> {
        let plugins = &self.config.plugins;
        let path = match &plugins.directory {
            Some(dir) => self.working_dir.join(dir),
            None => WatchDirectory::standard(&self.working_dir)?.path().to_path_buf(),
        };
        Ok(WatchDirectory::new(plugins.name.clone(), path))
    }

    /// Initialize from the configured watch directory.
    ///
    /// # Errors
    ///
    /// See [`StratumHost::set_watch_directories`].
    pub fn start(&self) -> LayerResult<Arc<ServiceManager>> {
        let wd = self.configured_watch_directory()?;
        self.set_watch_directories(vec![wd])
    }

    /// Initialize with a single watch directory.
    ///
    /// # Errors
    ///
    /// See [`StratumHost::set_watch_directories`].
    pub fn set_watch_directory(&self, watch_dir: WatchDirectory) -> LayerResult<Arc<ServiceManager>> {
        self.set_watch_directories(vec![watch_dir])
    }

    /// Initialize: scan, build, deploy the finder, return the manager.
    ///
    /// Succeeds at most once per host. A failed attempt may be retried.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::AlreadyInitialized`] after a successful call,
    /// otherwise any error from the initial rescan.
    pub fn set_watch_directories(
        &self,
        watch_dirs: Vec<WatchDirectory>,
    ) -> LayerResult<Arc<ServiceManager>> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LayerError::AlreadyInitialized);
        }

        let caller = match self.boot.module(HOST_MODULE) {
            Some(module) => Arc::clone(module),
            None => {
                self.initialized.store(false, Ordering::Release);
                return Err(LayerError::Resolution {
                    module: crate::domain::BOOT_DOMAIN.to_string(),
                    requires: HOST_MODULE.to_string(),
                });
            },
        };

        let manager = ServiceManager {
            watch_dirs,
            registry: LayerRegistry::new(Arc::clone(&self.boot)),
            catalog: self.catalog.clone(),
            scan: ScanOptions::from(&self.config.scan),
            locator: BootstrapLocator::from_config(&self.config.finder, &self.working_dir),
            caller,
            finder: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
            rescan_lock: Mutex::new(()),
        };

        if let Err(e) = manager.rescan() {
            self.initialized.store(false, Ordering::Release);
            return Err(e);
        }

        let manager = Arc::new(manager);
        if self.manager.set(Arc::clone(&manager)).is_err() {
            return Err(LayerError::AlreadyInitialized);
        }
        info!(
            watch_dirs = manager.watch_dirs.len(),
            domains = manager.registry.len(),
            finder = manager.finder().is_some(),
            "service manager initialized"
        );
        Ok(manager)
    }
}

/// Orchestrates rescans and serves capability lookups.
///
/// Single writer (rescan) and many readers. Readers always see either the
/// previous or the new registry, never a mix within one snapshot.
pub struct ServiceManager {
    watch_dirs: Vec<WatchDirectory>,
    registry: LayerRegistry,
    catalog: TypeCatalog,
    scan: ScanOptions,
    locator: BootstrapLocator,
    caller: Arc<Module>,
    finder: RwLock<Option<Arc<dyn ServiceFinder>>>,
    listeners: RwLock<Vec<Arc<dyn LayerLifecycleListener>>>,
    rescan_lock: Mutex<()>,
}

impl ServiceManager {
    /// Watch directories this manager scans.
    #[must_use]
    pub fn watch_directories(&self) -> &[WatchDirectory] {
        &self.watch_dirs
    }

    /// The layer registry.
    #[must_use]
    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Snapshot of every live domain, boot first.
    #[must_use]
    pub fn domains(&self) -> Vec<Arc<Domain>> {
        self.registry.all_domains()
    }

    /// Current rescan generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.registry.generation()
    }

    /// The installed finder, if any.
    #[must_use]
    pub fn finder(&self) -> Option<Arc<dyn ServiceFinder>> {
        self.finder
            .read()
            .unwrap_or_else(|e| {
                warn!("ServiceManager finder lock poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }

    fn install_finder(&self, finder: Arc<dyn ServiceFinder>) {
        *self.finder.write().unwrap_or_else(|e| {
            warn!("ServiceManager finder lock poisoned, recovering");
            e.into_inner()
        }) = Some(finder);
    }

    /// Register a listener notified on every rescan.
    pub fn add_listener(&self, listener: Arc<dyn LayerLifecycleListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| {
                warn!("ServiceManager listener lock poisoned, recovering");
                e.into_inner()
            })
            .push(listener);
    }

    /// Registered listeners plus any provided through the finder.
    fn lifecycle_listeners(&self) -> Vec<Arc<dyn LayerLifecycleListener>> {
        let mut listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| {
                warn!("ServiceManager listener lock poisoned, recovering");
                e.into_inner()
            })
            .clone();

        let Some(finder) = self.finder() else {
            return listeners;
        };
        match finder.loader(&ListenerCapability::id()) {
            Ok(providers) => {
                for provider in &providers {
                    match provider.get_as::<ListenerCapability>() {
                        Ok(listener) => listeners.push(listener),
                        Err(e) => warn!(
                            listener = %provider.type_name(),
                            error = %e,
                            "skipping lifecycle listener"
                        ),
                    }
                }
            },
            Err(e) => warn!(error = %e, "lifecycle listener lookup failed"),
        }
        listeners
    }

    /// Rebuild every plugin layer from scratch.
    ///
    /// Runs synchronously: notify removal, reset the registry, scan, build,
    /// install, redeploy the finder, notify addition. An error after the
    /// reset leaves the registry at the boot domain; the installed finder
    /// is only replaced on success.
    ///
    /// # Errors
    ///
    /// Returns resolution, package or finder-location errors.
    pub fn rescan(&self) -> LayerResult<()> {
        let _guard = self.rescan_lock.lock().unwrap_or_else(|e| {
            warn!("ServiceManager rescan lock poisoned, recovering");
            e.into_inner()
        });

        let generation = self.registry.next_generation();
        let builder = LayerBuilder::new(self.catalog.clone()).with_generation(generation);

        let previous = self.registry.plugin_domains();
        if !previous.is_empty() {
            let listeners = self.lifecycle_listeners();
            for domain in &previous {
                for listener in &listeners {
                    listener.layer_being_removed(domain.name(), domain);
                }
            }
        }
        drop(previous);
        self.registry.reset();

        for watch_dir in &self.watch_dirs {
            let artifacts = scan_artifacts(watch_dir.path(), &self.scan);
            if artifacts.is_empty() {
                info!(watch_dir = %watch_dir, "no plugin packages found");
                continue;
            }
            for artifact in &artifacts {
                let plugin = plugin_name(watch_dir, &artifact.path).unwrap_or_default();
                debug!(
                    path = %artifact.path.display(),
                    plugin = %plugin,
                    "discovered plugin package"
                );
            }
            let paths: Vec<PathBuf> = artifacts.into_iter().map(|a| a.path).collect();
            let domain = builder.build(
                watch_dir.name(),
                &paths,
                std::slice::from_ref(self.registry.boot()),
            )?;
            self.registry.install(domain);
        }

        let parents = self.registry.all_domains();
        if let Some(finder) = self.locator.deploy(&builder, &parents, &self.caller)? {
            self.install_finder(finder);
        }

        let added = self.registry.plugin_domains();
        if !added.is_empty() {
            let listeners = self.lifecycle_listeners();
            for domain in &added {
                for listener in &listeners {
                    listener.layer_added(domain.name(), domain);
                }
            }
        }

        info!(
            generation,
            domains = parents.len(),
            "rescan complete"
        );
        Ok(())
    }

    /// Providers of `capability` across all live domains.
    ///
    /// Declares interest on the finder's module first; that declaration is
    /// logged the first time only.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::FinderNotInstalled`] if no finder is installed.
    /// An empty sequence is not an error.
    pub fn find(&self, capability: &CapabilityId) -> LayerResult<ProviderSequence> {
        let finder = self.finder().ok_or(LayerError::FinderNotInstalled)?;
        if finder.ensure_uses(capability) {
            info!(
                capability = %capability,
                module = %finder.module().name(),
                "added dynamic use to installed finder"
            );
        }
        finder.loader(capability)
    }

    /// Instantiate every provider of `C`.
    ///
    /// # Errors
    ///
    /// Returns the lookup error or the first instantiation error.
    pub fn find_typed<C: Capability>(&self) -> LayerResult<Vec<Arc<C::Object>>> {
        self.find(&C::id())?.instances::<C>().collect()
    }

    /// Instantiate the first provider of `C`, if any.
    ///
    /// # Errors
    ///
    /// Returns the lookup error or the instantiation error.
    pub fn first<C: Capability>(&self) -> LayerResult<Option<Arc<C::Object>>> {
        match self.find(&C::id())?.find_first() {
            Some(provider) => provider.get_as::<C>().map(Some),
            None => Ok(None),
        }
    }

    /// Resolve a type by name, probing every live domain once in order.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::TypeNotFound`] with the number of domains
    /// probed when none declares the type.
    pub fn resolve_type(&self, name: &str) -> LayerResult<TypeHandle> {
        let domains = self.registry.all_domains();
        for domain in &domains {
            if let Some(handle) = domain.find_type(name) {
                debug!(type_name = %name, domain = %domain.name(), "resolved type");
                return Ok(handle);
            }
        }
        Err(LayerError::TypeNotFound {
            name: name.to_string(),
            probed: domains.len(),
        })
    }
}

impl fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceManager")
            .field("watch_dirs", &self.watch_dirs)
            .field("registry", &self.registry)
            .field("scan", &self.scan)
            .field("finder", &self.finder())
            .finish_non_exhaustive()
    }
}
