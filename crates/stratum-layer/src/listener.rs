//! Plugin layer lifecycle notifications.

use std::sync::Arc;

use tracing::info;

use crate::catalog::{TypeCatalog, into_instance};
use crate::domain::Domain;
use crate::service::Capability;

/// Capability id under which lifecycle listeners are provided.
pub const LISTENER_CAPABILITY: &str = "stratum.layer.LayerLifecycleListener";

/// Type name of the built-in logging listener.
pub const LOGGING_LISTENER_TYPE: &str = "stratum_layer::LoggingLifecycleListener";

/// Typed handle for [`LISTENER_CAPABILITY`].
#[derive(Debug)]
pub struct ListenerCapability;

impl Capability for ListenerCapability {
    const ID: &'static str = LISTENER_CAPABILITY;
    type Object = dyn LayerLifecycleListener;
}

/// Notified when plugin layers come and go.
///
/// Listeners that keep references into a layer must drop them when told the
/// layer is being removed, or the layer stays alive past its rescan.
pub trait LayerLifecycleListener: Send + Sync {
    /// A plugin layer was installed.
    fn layer_added(&self, name: &str, domain: &Arc<Domain>);

    /// A plugin layer is about to be dropped by a rescan.
    fn layer_being_removed(&self, name: &str, domain: &Arc<Domain>);
}

/// Logs lifecycle events at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingLifecycleListener;

impl LayerLifecycleListener for LoggingLifecycleListener {
    fn layer_added(&self, name: &str, domain: &Arc<Domain>) {
        info!(layer = %name, domain = %domain, "plugin layer added");
    }

    fn layer_being_removed(&self, name: &str, domain: &Arc<Domain>) {
        info!(layer = %name, domain = %domain, "plugin layer being removed");
    }
}

/// Register the built-in listener's code.
pub fn register_builtin(catalog: &TypeCatalog) {
    catalog.register_fn(LOGGING_LISTENER_TYPE, |_| {
        Ok(into_instance::<dyn LayerLifecycleListener>(Arc::new(
            LoggingLifecycleListener,
        )))
    });
}
