//! # Impress Core Plugin System Errors
//!
//! [`PluginSystemError`] covers everything that can go wrong while the UI
//! capability plugins are registered: duplicates, API incompatibility,
//! dependency resolution, component tag clashes, and an incomplete kit.
//! Every variant is fatal to startup.
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::traits::Capability;
use crate::plugin_system::version::VersionError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Capability '{capability}' is provided by both '{existing}' and '{plugin}'")]
    DuplicateCapability {
        capability: Capability,
        existing: String,
        plugin: String,
    },

    #[error("Plugin '{plugin}' is not compatible with API version {api_version} (supports {supported})")]
    IncompatibleApi {
        plugin: String,
        api_version: String,
        supported: String,
    },

    #[error("Component tag '{tag}' of '{capability}' is already registered by '{existing}'")]
    ComponentConflict {
        tag: String,
        capability: Capability,
        existing: Capability,
    },

    #[error("Plugin registration error for '{plugin_id}': {message}")]
    RegistrationError { plugin_id: String, message: String },

    #[error("Plugin '{plugin_id}' failed to install: {source}")]
    InstallFailed {
        plugin_id: String,
        #[source]
        source: Box<PluginSystemError>,
    },

    #[error("Capability registry is incomplete, missing: {}", .missing.iter().map(|c| c.name()).collect::<Vec<_>>().join(", "))]
    IncompleteRegistry { missing: Vec<Capability> },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Dependency resolution failed: {0}")]
    DependencyResolution(#[from] DependencyError),

    #[error("Version parsing error: {0}")]
    VersionParsing(#[from] VersionError),
}
