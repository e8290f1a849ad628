//! # Impress Core Plugin System
//!
//! Statically registered UI capability plugins. Each plugin provides exactly
//! one [`Capability`] and installs the component tags of its widget family
//! into a [`CapabilityRegistry`]; views build their component nodes through
//! that registry.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: the [`UiPlugin`] trait and the [`Capability`] enum.
//! - **[`registrar`]**: [`PluginRegistrar`], which checks duplicates, API
//!   compatibility and dependencies before installing anything.
//! - **[`registry`]**: [`CapabilityRegistry`] and [`ComponentFactory`].
//! - **[`dependency`]**: inter-capability dependencies and install ordering.
//! - **[`version`]**: semver ranges for API compatibility checks.
//! - **[`error`]**: [`PluginSystemError`](error::PluginSystemError).
pub mod dependency;
pub mod error;
pub mod registrar;
pub mod registry;
pub mod traits;
pub mod version;

pub use dependency::PluginDependency;
pub use error::PluginSystemError;
pub use registrar::PluginRegistrar;
pub use registry::{CapabilityRegistry, ComponentFactory, ComponentSpec, InstalledPlugin};
pub use traits::{Capability, UiPlugin};
pub use version::VersionRange;

// Test module declaration
#[cfg(test)]
pub(crate) mod tests;
