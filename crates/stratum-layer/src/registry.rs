//! Layer registry.
//!
//! The authoritative list of live domains. The boot domain is always
//! present; plugin domains are replaced wholesale on every rescan and each
//! rescan advances the generation counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::domain::Domain;

/// Registry of named domains.
#[derive(Debug)]
pub struct LayerRegistry {
    boot: Arc<Domain>,
    domains: RwLock<Vec<Arc<Domain>>>,
    generation: AtomicU64,
}

impl LayerRegistry {
    /// Create a registry holding only `boot`.
    #[must_use]
    pub fn new(boot: Arc<Domain>) -> Self {
        Self {
            domains: RwLock::new(vec![Arc::clone(&boot)]),
            boot,
            generation: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Domain>>> {
        self.domains.read().unwrap_or_else(|e| {
            warn!("LayerRegistry read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Domain>>> {
        self.domains.write().unwrap_or_else(|e| {
            warn!("LayerRegistry lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// The boot domain.
    #[must_use]
    pub fn boot(&self) -> &Arc<Domain> {
        &self.boot
    }

    /// Drop every plugin domain, leaving only the boot domain.
    pub fn reset(&self) {
        let mut domains = self.write();
        let dropped = domains.len().saturating_sub(1);
        *domains = vec![Arc::clone(&self.boot)];
        debug!(dropped, "registry reset to boot domain");
    }

    /// Add a domain.
    pub fn install(&self, domain: Arc<Domain>) {
        debug!(domain = %domain.name(), id = %domain.id(), "installing domain");
        self.write().push(domain);
    }

    /// Snapshot of all domains, boot first.
    #[must_use]
    pub fn all_domains(&self) -> Vec<Arc<Domain>> {
        self.read().clone()
    }

    /// Snapshot of all domains except boot.
    #[must_use]
    pub fn plugin_domains(&self) -> Vec<Arc<Domain>> {
        self.read()
            .iter()
            .filter(|d| d.id() != self.boot.id())
            .cloned()
            .collect()
    }

    /// The most recently installed domain with this name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Domain>> {
        self.read().iter().rev().find(|d| d.name() == name).cloned()
    }

    /// Whether this exact domain instance is registered.
    #[must_use]
    pub fn contains(&self, domain: &Domain) -> bool {
        self.read().iter().any(|d| d.id() == domain.id())
    }

    /// Number of registered domains, including boot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Always `false`: the boot domain is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Advance and return the generation.
    pub fn next_generation(&self) -> u64 {
        self.generation
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1)
    }
}
