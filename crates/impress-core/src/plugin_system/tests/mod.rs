
use std::sync::Arc;

use serde_json::json;

use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::{CapabilityRegistry, ComponentSpec};
use crate::plugin_system::traits::{Capability, UiPlugin};
use crate::plugin_system::version::VersionRange;

/// Configurable plugin for exercising the registrar and the kernel
pub(crate) struct MockPlugin {
    pub name: &'static str,
    pub version: &'static str,
    pub capability: Capability,
    pub api: &'static str,
    pub dependencies: Vec<PluginDependency>,
    pub tags: Vec<&'static str>,
    pub foreign_tag: Option<(Capability, &'static str)>,
}

impl MockPlugin {
    pub fn new(name: &'static str, capability: Capability) -> Self {
        Self {
            name,
            version: "1.0.0",
            capability,
            api: "^0.1",
            dependencies: Vec::new(),
            tags: Vec::new(),
            foreign_tag: None,
        }
    }

    pub fn requires(mut self, capability: Capability) -> Self {
        self.dependencies.push(PluginDependency::required_any(capability));
        self
    }

    pub fn boxed(self) -> Box<dyn UiPlugin> {
        Box::new(self)
    }
}

impl UiPlugin for MockPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &str {
        self.version
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    fn compatible_api_versions(&self) -> Vec<VersionRange> {
        VersionRange::from_constraint(self.api).into_iter().collect()
    }

    fn dependencies(&self) -> Vec<PluginDependency> {
        self.dependencies.clone()
    }

    fn install(&self, registry: &mut CapabilityRegistry) -> Result<(), PluginSystemError> {
        let default_tag = format!("a-{}", self.capability.name());
        let tags: Vec<String> = if self.tags.is_empty() {
            vec![default_tag]
        } else {
            self.tags.iter().map(|t| t.to_string()).collect()
        };
        for tag in tags {
            let spec = ComponentSpec::new(tag).with_default("size", json!("default"));
            registry.register_component(self.capability, Arc::new(spec))?;
        }
        if let Some((capability, tag)) = self.foreign_tag {
            registry.register_component(capability, Arc::new(ComponentSpec::new(tag)))?;
        }
        Ok(())
    }
}

/// One mock plugin per capability, registering `a-<capability>`
pub(crate) fn mock_kit() -> Vec<Box<dyn UiPlugin>> {
    Capability::ALL
        .into_iter()
        .map(|capability| MockPlugin::new(capability.name(), capability).boxed())
        .collect()
}
