// Subsystems wired together by the kernel bootstrapper
pub mod config;
pub mod http;
pub mod kernel;
pub mod notify;
pub mod plugin_system;
pub mod storage;
pub mod view;

// Re-export key public types/traits for the binary and the plugin crates
pub use config::AppConfig;
pub use kernel::error::Error as KernelError;
pub use kernel::{AppContext, Application, BootPhase};
pub use notify::Notifier;
pub use http::HttpClient;
pub use plugin_system::{Capability, CapabilityRegistry, UiPlugin};
pub use storage::{LocalStore, StoreSchema, TableSchema};
pub use view::{HostDocument, RootView, ViewNode};
