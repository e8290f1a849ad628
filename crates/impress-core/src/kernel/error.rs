//! # Impress Core Kernel Errors
//!
//! Defines the top-level error type of the bootstrapper.
//!
//! Every subsystem owns a typed error enum; [`Error`] wraps them through
//! `#[from]` and adds the lifecycle and registry failures raised by the kernel
//! itself. Every variant reaching [`Application`](crate::kernel::Application)
//! is fatal to startup.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::http::error::HttpError;
use crate::notify::error::NotifyError;
use crate::plugin_system::error::PluginSystemError;
use crate::storage::error::StorageSystemError;
use crate::view::error::ViewError;

/// Custom error type for the impress application
#[derive(Debug, ThisError)]
pub enum Error {
    /// Local store failed to open, migrate, or serve a request
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// A UI capability plugin failed to register
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("HTTP client error: {0}")]
    Http(#[from] HttpError),

    /// Root view construction or attachment failed
    #[error("View error: {0}")]
    View(#[from] ViewError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurring during a specific boot phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        component_name: Option<String>,
        message: String,
        #[source]
        source: Option<Box<Error>>, // Can wrap another kernel error or a subsystem error
    },

    /// Error related to DependencyRegistry operations or component lookup failures.
    #[error("Component registry error during operation '{operation}': {message}")]
    ComponentRegistryError {
        operation: String, // e.g., "RegisterInstance", "BuildContext"
        component_name: Option<String>,
        message: String,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a specific phase of the boot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Preflight")]
    Preflight,
    #[error("StoreOpen")]
    StoreOpen,
    #[error("PublishSingletons")]
    PublishSingletons,
    #[error("RegisterPlugins")]
    RegisterPlugins,
    #[error("Mount")]
    Mount,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Wraps `source` as the cause of a failure in `phase`.
    pub fn lifecycle(phase: KernelLifecyclePhase, message: impl Into<String>, source: Error) -> Self {
        Error::KernelLifecycleError {
            phase,
            component_name: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The boot phase this error was raised in, if it is a lifecycle error.
    pub fn phase(&self) -> Option<KernelLifecyclePhase> {
        match self {
            Error::KernelLifecycleError { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
