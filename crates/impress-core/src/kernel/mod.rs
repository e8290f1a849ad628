//! # Impress Core Kernel
//!
//! The `kernel` module drives application startup. It owns the linear boot
//! sequence and the registry through which shared handles are published.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Application Bootstrapping**: [`Application`](bootstrap::Application) runs
//!   `store-opened → singletons-published → plugins-registered → mounted`.
//! - **Singleton Registration**: the [`KernelComponent`](component::KernelComponent)
//!   trait and the [`DependencyRegistry`](component::DependencyRegistry), which
//!   holds exactly one instance per component type.
//! - **View Context**: [`AppContext`](context::AppContext), the explicit handle
//!   bundle passed to every view.
//! - **Core Constants**: store name, schema version, API version, mount target.
//! - **Error Handling**: [`Error`](error::Error) and the `Result` alias.
pub mod bootstrap;
pub mod component;
pub mod constants;
pub mod context;
pub mod error;

pub use bootstrap::{Application, BootPhase};
pub use component::{DependencyRegistry, KernelComponent};
pub use context::AppContext;
pub use error::{Error, KernelLifecyclePhase, Result};
