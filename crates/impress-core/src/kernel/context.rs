use std::sync::Arc;

use crate::http::HttpClient;
use crate::kernel::component::DependencyRegistry;
use crate::kernel::error::Result;
use crate::notify::Notifier;
use crate::plugin_system::CapabilityRegistry;
use crate::storage::LocalStore;

/// Handles passed explicitly to every view
///
/// Built once, at mount time, from the published singletons and the
/// installed capabilities. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppContext {
    store: Arc<LocalStore>,
    notifier: Arc<Notifier>,
    http: Arc<HttpClient>,
    capabilities: Arc<CapabilityRegistry>,
}

impl AppContext {
    pub fn new(
        store: Arc<LocalStore>,
        notifier: Arc<Notifier>,
        http: Arc<HttpClient>,
        capabilities: Arc<CapabilityRegistry>,
    ) -> Self {
        Self {
            store,
            notifier,
            http,
            capabilities,
        }
    }

    /// Collect the published singletons; any one missing is an error.
    pub fn from_registry(registry: &DependencyRegistry, capabilities: Arc<CapabilityRegistry>) -> Result<Self> {
        Ok(Self::new(
            registry.require::<LocalStore>("LocalStore")?,
            registry.require::<Notifier>("Notifier")?,
            registry.require::<HttpClient>("HttpClient")?,
            capabilities,
        ))
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.capabilities
    }
}
