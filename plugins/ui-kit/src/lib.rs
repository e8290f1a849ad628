//! The stock UI kit: one plugin per [`Capability`], each registering the
//! `a-*` component tags of its widget family.
use std::sync::Arc;

use impress_core::plugin_system::{
    Capability, CapabilityRegistry, ComponentSpec, PluginDependency, PluginSystemError, UiPlugin,
    VersionRange,
};
use serde_json::json;

const COMPATIBLE_API_REQ: &str = "^0.1";

/// A widget family of the kit
#[derive(Debug, Clone, Copy)]
pub struct KitPlugin {
    capability: Capability,
}

impl KitPlugin {
    pub fn new(capability: Capability) -> Self {
        Self { capability }
    }

    /// Component tags with their default props.
    pub fn components(&self) -> Vec<ComponentSpec> {
        match self.capability {
            Capability::Menu => vec![
                ComponentSpec::new("a-menu")
                    .with_default("mode", json!("vertical"))
                    .with_default("theme", json!("light")),
                ComponentSpec::new("a-menu-item"),
                ComponentSpec::new("a-sub-menu"),
                ComponentSpec::new("a-menu-item-group"),
                ComponentSpec::new("a-menu-divider"),
            ],
            Capability::Icon => vec![ComponentSpec::new("a-icon").with_default("theme", json!("outlined"))],
            Capability::Upload => vec![
                ComponentSpec::new("a-upload")
                    .with_default("list_type", json!("text"))
                    .with_default("multiple", json!(false)),
                ComponentSpec::new("a-upload-dragger").with_default("multiple", json!(false)),
            ],
            Capability::Button => vec![
                ComponentSpec::new("a-button")
                    .with_default("type", json!("default"))
                    .with_default("size", json!("default")),
                ComponentSpec::new("a-button-group"),
            ],
            Capability::Progress => vec![
                ComponentSpec::new("a-progress")
                    .with_default("type", json!("line"))
                    .with_default("percent", json!(0)),
            ],
            Capability::Input => vec![
                ComponentSpec::new("a-input").with_default("size", json!("default")),
                ComponentSpec::new("a-input-group"),
                ComponentSpec::new("a-input-search"),
                ComponentSpec::new("a-textarea"),
                ComponentSpec::new("a-input-password"),
            ],
            Capability::Table => vec![
                ComponentSpec::new("a-table")
                    .with_default("bordered", json!(false))
                    .with_default("size", json!("default")),
                ComponentSpec::new("a-table-column"),
                ComponentSpec::new("a-table-column-group"),
            ],
            Capability::Spin => vec![
                ComponentSpec::new("a-spin")
                    .with_default("spinning", json!(true))
                    .with_default("size", json!("default")),
            ],
        }
    }

    fn required_capabilities(&self) -> &'static [Capability] {
        match self.capability {
            Capability::Upload => &[Capability::Icon, Capability::Progress],
            Capability::Table => &[Capability::Spin, Capability::Icon, Capability::Menu],
            Capability::Input | Capability::Button | Capability::Progress => &[Capability::Icon],
            Capability::Menu | Capability::Icon | Capability::Spin => &[],
        }
    }
}

impl UiPlugin for KitPlugin {
    fn name(&self) -> &'static str {
        match self.capability {
            Capability::Menu => "ui-kit-menu",
            Capability::Icon => "ui-kit-icon",
            Capability::Upload => "ui-kit-upload",
            Capability::Button => "ui-kit-button",
            Capability::Progress => "ui-kit-progress",
            Capability::Input => "ui-kit-input",
            Capability::Table => "ui-kit-table",
            Capability::Spin => "ui-kit-spin",
        }
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    fn compatible_api_versions(&self) -> Vec<VersionRange> {
        match VersionRange::from_constraint(COMPATIBLE_API_REQ) {
            Ok(vr) => vec![vr],
            Err(e) => {
                log::error!(
                    "Failed to parse API version requirement ('{}') for {}: {}",
                    COMPATIBLE_API_REQ,
                    self.name(),
                    e
                );
                // No ranges means incompatible
                vec![]
            }
        }
    }

    fn dependencies(&self) -> Vec<PluginDependency> {
        self.required_capabilities()
            .iter()
            .map(|capability| PluginDependency::required_any(*capability))
            .collect()
    }

    fn install(&self, registry: &mut CapabilityRegistry) -> Result<(), PluginSystemError> {
        for spec in self.components() {
            registry.register_component(self.capability, Arc::new(spec))?;
        }
        Ok(())
    }
}

/// Plugin for one capability.
pub fn plugin(capability: Capability) -> Box<dyn UiPlugin> {
    Box::new(KitPlugin::new(capability))
}

/// The full kit, one plugin per capability.
pub fn all() -> Vec<Box<dyn UiPlugin>> {
    Capability::ALL.into_iter().map(plugin).collect()
}
