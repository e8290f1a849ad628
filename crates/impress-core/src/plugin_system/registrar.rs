use std::collections::HashMap;

use semver::Version;

use crate::kernel::constants;
use crate::plugin_system::dependency::install_order;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::{CapabilityRegistry, InstalledPlugin};
use crate::plugin_system::traits::{Capability, UiPlugin};
use crate::plugin_system::version::parse_version;

/// Validates and installs UI capability plugins
#[derive(Debug, Clone)]
pub struct PluginRegistrar {
    api_version: Version,
}

impl PluginRegistrar {
    pub fn new(api_version: &str) -> Result<Self, PluginSystemError> {
        Ok(Self {
            api_version: parse_version(api_version)?,
        })
    }

    /// Registrar for the API version this crate exposes.
    pub fn for_current_api() -> Result<Self, PluginSystemError> {
        Self::new(constants::API_VERSION)
    }

    pub fn api_version(&self) -> &Version {
        &self.api_version
    }

    pub fn check_compatible(&self, plugin: &dyn UiPlugin) -> Result<(), PluginSystemError> {
        let ranges = plugin.compatible_api_versions();
        if ranges.iter().any(|range| range.includes(&self.api_version)) {
            return Ok(());
        }
        let supported = if ranges.is_empty() {
            "nothing".to_string()
        } else {
            ranges.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(" | ")
        };
        Err(PluginSystemError::IncompatibleApi {
            plugin: plugin.name().to_string(),
            api_version: self.api_version.to_string(),
            supported,
        })
    }

    /// Install `plugins` into `registry`, dependencies first.
    ///
    /// Either every plugin is installed or `registry` is left untouched.
    /// Returns the capabilities in the order they were installed.
    pub fn install(
        &self,
        plugins: Vec<Box<dyn UiPlugin>>,
        registry: &mut CapabilityRegistry,
    ) -> Result<Vec<Capability>, PluginSystemError> {
        let mut seen: HashMap<Capability, &'static str> = HashMap::new();
        for plugin in &plugins {
            let capability = plugin.capability();
            let existing = registry
                .resolve(capability.name())
                .map(|p| p.name.clone())
                .or_else(|| seen.get(&capability).map(|name| name.to_string()));
            if let Some(existing) = existing {
                return Err(PluginSystemError::DuplicateCapability {
                    capability,
                    existing,
                    plugin: plugin.name().to_string(),
                });
            }
            seen.insert(capability, plugin.name());
            self.check_compatible(plugin.as_ref())?;
        }

        let order = install_order(&plugins, registry)?;

        let mut scratch = registry.clone();
        let mut installed = Vec::with_capacity(order.len());
        for index in order {
            let plugin = &plugins[index];
            let capability = plugin.capability();
            let before_own = scratch.tags_for(capability).len();
            let before_total = scratch.component_count();

            plugin
                .install(&mut scratch)
                .map_err(|e| PluginSystemError::InstallFailed {
                    plugin_id: plugin.name().to_string(),
                    source: Box::new(e),
                })?;

            let added_own = scratch.tags_for(capability).len() - before_own;
            let added_total = scratch.component_count() - before_total;
            if added_own == 0 {
                return Err(PluginSystemError::RegistrationError {
                    plugin_id: plugin.name().to_string(),
                    message: format!("registered no components for '{capability}'"),
                });
            }
            if added_total != added_own {
                return Err(PluginSystemError::RegistrationError {
                    plugin_id: plugin.name().to_string(),
                    message: "registered components for another capability".to_string(),
                });
            }

            scratch.record_plugin(InstalledPlugin {
                name: plugin.name().to_string(),
                version: plugin.version().to_string(),
                capability,
            });
            log::debug!(
                "Installed plugin '{}' v{} for '{}' ({} components)",
                plugin.name(),
                plugin.version(),
                capability,
                added_own
            );
            installed.push(capability);
        }

        *registry = scratch;
        Ok(installed)
    }

    /// Install `plugins` and require the registry to provide every capability.
    pub fn register(
        &self,
        plugins: Vec<Box<dyn UiPlugin>>,
        registry: &mut CapabilityRegistry,
    ) -> Result<Vec<Capability>, PluginSystemError> {
        let mut scratch = registry.clone();
        let installed = self.install(plugins, &mut scratch)?;
        scratch.ensure_complete()?;
        *registry = scratch;
        log::info!("Registered {} UI capability plugins", installed.len());
        Ok(installed)
    }
}
