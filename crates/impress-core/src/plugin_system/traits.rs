use std::fmt;
use std::str::FromStr;

use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::CapabilityRegistry;
use crate::plugin_system::version::VersionRange;

/// The UI capabilities an application view may rely on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Menu,
    Icon,
    Upload,
    Button,
    Progress,
    Input,
    Table,
    Spin,
}

impl Capability {
    /// Every capability, in registration order of the stock kit.
    pub const ALL: [Capability; 8] = [
        Capability::Menu,
        Capability::Icon,
        Capability::Upload,
        Capability::Button,
        Capability::Progress,
        Capability::Input,
        Capability::Table,
        Capability::Spin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Menu => "menu",
            Capability::Icon => "icon",
            Capability::Upload => "upload",
            Capability::Button => "button",
            Capability::Progress => "progress",
            Capability::Input => "input",
            Capability::Table => "table",
            Capability::Spin => "spin",
        }
    }

    /// Case-insensitive lookup; `spinner` is accepted for [`Capability::Spin`].
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name == "spinner" {
            return Some(Capability::Spin);
        }
        Capability::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = PluginSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::from_name(s).ok_or_else(|| PluginSystemError::UnknownCapability(s.to_string()))
    }
}

/// A statically linked plugin providing one UI capability
pub trait UiPlugin: Send + Sync {
    /// The name of the plugin
    fn name(&self) -> &'static str;

    /// The version of the plugin
    fn version(&self) -> &str;

    /// The capability this plugin provides
    fn capability(&self) -> Capability;

    /// Compatible API versions
    fn compatible_api_versions(&self) -> Vec<VersionRange>;

    /// Capabilities that must be installed before this one
    fn dependencies(&self) -> Vec<PluginDependency> {
        Vec::new()
    }

    /// Register this plugin's component tags.
    fn install(&self, registry: &mut CapabilityRegistry) -> Result<(), PluginSystemError>;
}

impl fmt::Debug for dyn UiPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiPlugin")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("capability", &self.capability())
            .finish()
    }
}
