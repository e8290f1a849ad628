use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::Capability;
use crate::view::error::ViewError;
use crate::view::node::{Props, ViewNode};

/// Builds component nodes for one registered tag
pub trait ComponentFactory: Send + Sync + fmt::Debug {
    fn tag(&self) -> &str;

    fn create(&self, capability: Capability, props: Props) -> Result<ViewNode, ViewError>;
}

/// Factory producing a component node whose props start from fixed defaults
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    tag: String,
    defaults: Props,
}

impl ComponentSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            defaults: Props::new(),
        }
    }

    pub fn with_default(mut self, key: &str, value: Value) -> Self {
        self.defaults.insert(key.to_string(), value);
        self
    }

    pub fn defaults(&self) -> &Props {
        &self.defaults
    }
}

impl ComponentFactory for ComponentSpec {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn create(&self, capability: Capability, props: Props) -> Result<ViewNode, ViewError> {
        let mut merged = self.defaults.clone();
        merged.extend(props);
        Ok(ViewNode::Component {
            tag: self.tag.clone(),
            capability,
            props: merged,
            children: Vec::new(),
        })
    }
}

/// A plugin that has been installed into the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    pub name: String,
    pub version: String,
    pub capability: Capability,
}

#[derive(Debug, Clone)]
struct ComponentEntry {
    capability: Capability,
    factory: Arc<dyn ComponentFactory>,
}

/// Installed UI capabilities and the component tags they provide
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    plugins: BTreeMap<Capability, InstalledPlugin>,
    components: BTreeMap<String, ComponentEntry>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component tag on behalf of `capability`.
    pub fn register_component(
        &mut self,
        capability: Capability,
        factory: Arc<dyn ComponentFactory>,
    ) -> Result<(), PluginSystemError> {
        let tag = factory.tag().to_string();
        if let Some(existing) = self.components.get(&tag) {
            return Err(PluginSystemError::ComponentConflict {
                tag,
                capability,
                existing: existing.capability,
            });
        }
        log::trace!("Registering component '{}' for capability '{}'", tag, capability);
        self.components.insert(tag, ComponentEntry { capability, factory });
        Ok(())
    }

    pub(crate) fn record_plugin(&mut self, plugin: InstalledPlugin) {
        self.plugins.insert(plugin.capability, plugin);
    }

    /// Plugin installed for a capability name (`spinner` resolves to `spin`).
    pub fn resolve(&self, name: &str) -> Option<&InstalledPlugin> {
        Capability::from_name(name).and_then(|capability| self.plugins.get(&capability))
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.plugins.contains_key(&capability)
    }

    /// Whether a component tag is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// Build a component node for `tag`.
    pub fn create(&self, tag: &str, props: Props) -> Result<ViewNode, ViewError> {
        let entry = self
            .components
            .get(tag)
            .ok_or_else(|| ViewError::ComponentNotFound(tag.to_string()))?;
        entry.factory.create(entry.capability, props)
    }

    /// Installed capabilities, in declaration order.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.plugins.keys().copied().collect()
    }

    pub fn plugins(&self) -> impl Iterator<Item = &InstalledPlugin> {
        self.plugins.values()
    }

    /// Component tags registered for a capability, sorted.
    pub fn tags_for(&self, capability: Capability) -> Vec<&str> {
        self.components
            .iter()
            .filter(|(_, entry)| entry.capability == capability)
            .map(|(tag, _)| tag.as_str())
            .collect()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Capabilities with no installed plugin.
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.plugins.contains_key(c))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn ensure_complete(&self) -> Result<(), PluginSystemError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PluginSystemError::IncompleteRegistry { missing })
        }
    }
}
