use std::collections::{HashMap, VecDeque};
use std::fmt;

use thiserror::Error;

use crate::plugin_system::registry::CapabilityRegistry;
use crate::plugin_system::traits::{Capability, UiPlugin};
use crate::plugin_system::version::VersionRange;

/// Represents a dependency on the plugin providing another capability
#[derive(Debug, Clone)]
pub struct PluginDependency {
    pub capability: Capability,

    /// The version range that is acceptable
    pub version_range: Option<VersionRange>,

    /// Whether this is a hard requirement or optional dependency
    pub required: bool,
}

/// Error that can occur when resolving dependencies
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("Plugin '{plugin}' requires capability '{capability}', which no plugin provides")]
    MissingDependency { plugin: String, capability: Capability },

    #[error("Plugin '{plugin}' requires '{capability}' in range '{required_range}' but found '{actual_version}'")]
    IncompatibleVersion {
        plugin: String,
        capability: Capability,
        required_range: VersionRange,
        actual_version: String,
    },

    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
}

impl PluginDependency {
    /// Create a new required dependency with a specific version range
    pub fn required(capability: Capability, version_range: VersionRange) -> Self {
        Self {
            capability,
            version_range: Some(version_range),
            required: true,
        }
    }

    /// Create a new required dependency with any version
    pub fn required_any(capability: Capability) -> Self {
        Self {
            capability,
            version_range: None,
            required: true,
        }
    }

    /// Ordered after the provider when present, ignored otherwise
    pub fn optional_any(capability: Capability) -> Self {
        Self {
            capability,
            version_range: None,
            required: false,
        }
    }

    /// Check if this dependency is compatible with the given plugin version string
    pub fn is_compatible_with(&self, version: &str) -> bool {
        self.version_range
            .as_ref()
            .map_or(true, |range| range.includes_str(version))
    }
}

impl fmt::Display for PluginDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement_type = if self.required { "Requires" } else { "Optional" };
        match &self.version_range {
            Some(range) => write!(
                f,
                "{} capability: {} (version: {})",
                requirement_type,
                self.capability,
                range.constraint_string()
            ),
            None => write!(f, "{} capability: {} (any version)", requirement_type, self.capability),
        }
    }
}

/// Order in which `plugins` must be installed: dependencies first, ties kept
/// in input order.
///
/// Dependencies may be satisfied by plugins in the batch or by plugins already
/// installed in `installed`. Returns indexes into `plugins`.
pub fn install_order(
    plugins: &[Box<dyn UiPlugin>],
    installed: &CapabilityRegistry,
) -> Result<Vec<usize>, DependencyError> {
    let by_capability: HashMap<Capability, usize> = plugins
        .iter()
        .enumerate()
        .map(|(index, plugin)| (plugin.capability(), index))
        .collect();

    // pending[i]: unresolved in-batch dependencies of plugin i
    let mut pending = vec![0usize; plugins.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); plugins.len()];

    for (index, plugin) in plugins.iter().enumerate() {
        for dep in plugin.dependencies() {
            let provider_version = match by_capability.get(&dep.capability) {
                Some(&provider) => {
                    if provider == index {
                        return Err(DependencyError::CyclicDependency(vec![
                            plugin.name().to_string(),
                            plugin.name().to_string(),
                        ]));
                    }
                    pending[index] += 1;
                    dependents[provider].push(index);
                    Some(plugins[provider].version().to_string())
                }
                None => installed.resolve(dep.capability.name()).map(|p| p.version.clone()),
            };

            match (&provider_version, &dep.version_range) {
                (Some(version), Some(range)) if !range.includes_str(version) => {
                    return Err(DependencyError::IncompatibleVersion {
                        plugin: plugin.name().to_string(),
                        capability: dep.capability,
                        required_range: range.clone(),
                        actual_version: version.clone(),
                    });
                }
                (Some(_), _) => {}
                (None, _) if dep.required => {
                    return Err(DependencyError::MissingDependency {
                        plugin: plugin.name().to_string(),
                        capability: dep.capability,
                    });
                }
                (None, _) => {
                    log::debug!(
                        "Optional dependency '{}' of plugin '{}' is not available",
                        dep.capability,
                        plugin.name()
                    );
                }
            }
        }
    }

    // Kahn's algorithm, seeded in input order
    let mut queue: VecDeque<usize> = (0..plugins.len()).filter(|i| pending[*i] == 0).collect();
    let mut order = Vec::with_capacity(plugins.len());
    while let Some(index) = queue.pop_front() {
        order.push(index);
        for &dependent in &dependents[index] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() == plugins.len() {
        Ok(order)
    } else {
        // Only the nodes involved, not the exact path
        let cycle: Vec<String> = (0..plugins.len())
            .filter(|i| !order.contains(i))
            .map(|i| plugins[i].name().to_string())
            .collect();
        Err(DependencyError::CyclicDependency(cycle))
    }
}

