use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::http::HttpClient;
use crate::kernel::component::{DependencyRegistry, KernelComponent};
use crate::kernel::constants;
use crate::kernel::context::AppContext;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::notify::Notifier;
use crate::plugin_system::{Capability, CapabilityRegistry, PluginRegistrar, UiPlugin};
use crate::storage::{impress_schema, LocalStore, StoreSchema};
use crate::view::document::normalize_id;
use crate::view::{HostDocument, MountedView, RootView, ViewError};

/// Where the boot sequence currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Created,
    StoreOpened,
    SingletonsPublished,
    PluginsRegistered,
    Mounted,
    /// Terminal; no step runs after a failure
    Failed(KernelLifecyclePhase),
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootPhase::Created => write!(f, "created"),
            BootPhase::StoreOpened => write!(f, "store-opened"),
            BootPhase::SingletonsPublished => write!(f, "singletons-published"),
            BootPhase::PluginsRegistered => write!(f, "plugins-registered"),
            BootPhase::Mounted => write!(f, "mounted"),
            BootPhase::Failed(phase) => write!(f, "failed({phase})"),
        }
    }
}

/// The application bootstrapper
///
/// Runs `open_store → publish_singletons → register_plugins → mount` exactly
/// once, in that order. Each step checks the phase left by the previous one.
pub struct Application {
    config: AppConfig,
    schema: StoreSchema,
    phase: BootPhase,
    dependencies: DependencyRegistry,
    capabilities: CapabilityRegistry,
    context: Option<AppContext>,
    mounted_view: Option<String>,
}

impl Application {
    /// Bootstrapper for the stock schema, named after `config.store.name`.
    pub fn new(config: AppConfig) -> Self {
        let mut schema = impress_schema();
        schema.name = config.store.name.clone();
        Self::with_schema(config, schema)
    }

    pub fn with_schema(config: AppConfig, schema: StoreSchema) -> Self {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        Self {
            config,
            schema,
            phase: BootPhase::Created,
            dependencies: DependencyRegistry::new(),
            capabilities: CapabilityRegistry::new(),
            context: None,
            mounted_view: None,
        }
    }

    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.phase == BootPhase::Mounted
    }

    /// The view context; only exists once the root view is mounted.
    pub fn context(&self) -> Option<&AppContext> {
        self.context.as_ref()
    }

    /// A published singleton by concrete type.
    pub fn get_component<T: KernelComponent + 'static>(&self) -> Option<Arc<T>> {
        self.dependencies.get_concrete::<T>()
    }

    /// Run the whole boot sequence.
    ///
    /// The attachment point is checked before anything else, so a missing
    /// target fails without opening the store.
    pub async fn bootstrap(
        &mut self,
        plugins: Vec<Box<dyn UiPlugin>>,
        root: &dyn RootView,
        document: &mut HostDocument,
    ) -> Result<()> {
        self.preflight(document)?;
        self.open_store().await?;
        self.publish_singletons().await?;
        self.register_plugins(plugins)?;
        self.mount(root, document)?;
        log::info!("Application mounted at #{}", self.mount_target()?);
        Ok(())
    }

    /// Check the mount target exists before any step runs.
    pub fn preflight(&mut self, document: &HostDocument) -> Result<()> {
        self.expect_phase(BootPhase::Created, KernelLifecyclePhase::Preflight)?;
        let target = match self.mount_target() {
            Ok(target) => target,
            Err(e) => return Err(self.fail(KernelLifecyclePhase::Preflight, e)),
        };
        if !document.has_attachment_point(&target) {
            return Err(self.fail(
                KernelLifecyclePhase::Preflight,
                ViewError::AttachmentPointNotFound(target).into(),
            ));
        }
        Ok(())
    }

    /// Open the local store and wait for it to be ready.
    pub async fn open_store(&mut self) -> Result<()> {
        self.expect_phase(BootPhase::Created, KernelLifecyclePhase::StoreOpen)?;

        let dir = self.config.store.resolved_dir();
        let schema = self.schema.clone();
        log::info!("Opening store '{}' in {}", schema.name, dir.display());
        let opened = tokio::task::spawn_blocking(move || LocalStore::open(&dir, schema)).await;

        let store = match opened {
            Ok(Ok(store)) => store,
            Ok(Err(e)) => return Err(self.fail(KernelLifecyclePhase::StoreOpen, e.into())),
            Err(join_error) => {
                let e = Error::Other(format!("store open task failed: {join_error}"));
                return Err(self.fail(KernelLifecyclePhase::StoreOpen, e));
            }
        };

        if let Err(e) = self.dependencies.register_instance(Arc::new(store)) {
            return Err(self.fail(KernelLifecyclePhase::StoreOpen, e));
        }
        self.phase = BootPhase::StoreOpened;
        Ok(())
    }

    /// Publish the notifier and HTTP client next to the store, then
    /// initialize all three in publication order.
    pub async fn publish_singletons(&mut self) -> Result<()> {
        self.expect_phase(BootPhase::StoreOpened, KernelLifecyclePhase::PublishSingletons)?;

        if let Err(e) = self.publish_handles() {
            return Err(self.fail(KernelLifecyclePhase::PublishSingletons, e));
        }
        for component in self.dependencies.components_in_order() {
            log::debug!("Initializing component: {}", component.name());
            if let Err(e) = component.initialize().await {
                let e = Error::KernelLifecycleError {
                    phase: KernelLifecyclePhase::PublishSingletons,
                    component_name: Some(component.name().to_string()),
                    message: "component failed to initialize".to_string(),
                    source: Some(Box::new(e)),
                };
                return Err(self.fail(KernelLifecyclePhase::PublishSingletons, e));
            }
        }
        self.phase = BootPhase::SingletonsPublished;
        Ok(())
    }

    fn publish_handles(&mut self) -> Result<()> {
        let notifier = Arc::new(Notifier::new(&self.config.notifications));
        let http = Arc::new(HttpClient::new(&self.config.http)?);
        self.dependencies.register_instance(notifier)?;
        self.dependencies.register_instance(http)?;
        Ok(())
    }

    /// Install the UI capability plugins; all eight capabilities must end up
    /// installed.
    pub fn register_plugins(&mut self, plugins: Vec<Box<dyn UiPlugin>>) -> Result<Vec<Capability>> {
        self.expect_phase(BootPhase::SingletonsPublished, KernelLifecyclePhase::RegisterPlugins)?;

        let registered = PluginRegistrar::for_current_api()
            .and_then(|registrar| registrar.register(plugins, &mut self.capabilities));
        match registered {
            Ok(installed) => {
                self.phase = BootPhase::PluginsRegistered;
                Ok(installed)
            }
            Err(e) => Err(self.fail(KernelLifecyclePhase::RegisterPlugins, e.into())),
        }
    }

    /// Render `root` with a fresh [`AppContext`] and attach it to the mount
    /// target. A second mount is rejected and leaves the first one in place.
    pub fn mount(&mut self, root: &dyn RootView, document: &mut HostDocument) -> Result<()> {
        if self.phase == BootPhase::Mounted {
            return Err(ViewError::AlreadyMounted {
                target: self.mount_target()?,
                view: self.mounted_view.clone().unwrap_or_default(),
            }
            .into());
        }
        self.expect_phase(BootPhase::PluginsRegistered, KernelLifecyclePhase::Mount)?;

        match self.render_and_attach(root, document) {
            Ok((context, mounted)) => {
                log::info!(
                    "Mounted view '{}' at #{} ({} components)",
                    mounted.view_name,
                    mounted.target,
                    mounted.root.count_components()
                );
                self.context = Some(context);
                self.mounted_view = Some(mounted.view_name);
                self.phase = BootPhase::Mounted;
                Ok(())
            }
            Err(e) => Err(self.fail(KernelLifecyclePhase::Mount, e)),
        }
    }

    fn render_and_attach(
        &self,
        root: &dyn RootView,
        document: &mut HostDocument,
    ) -> Result<(AppContext, MountedView)> {
        let store = self.dependencies.require::<LocalStore>("LocalStore")?;
        if !store.is_ready() {
            return Err(Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::Mount,
                component_name: Some("LocalStore".to_string()),
                message: "store is not ready".to_string(),
                source: None,
            });
        }

        let target = self.mount_target()?;
        if !document.has_attachment_point(&target) {
            return Err(ViewError::AttachmentPointNotFound(target).into());
        }

        let context = AppContext::from_registry(&self.dependencies, Arc::new(self.capabilities.clone()))?;
        let tree = root.render(&context)?;
        let mounted = MountedView {
            view_name: root.name().to_string(),
            target: target.clone(),
            root: tree,
        };
        document.attach(&target, mounted.clone())?;
        Ok((context, mounted))
    }

    fn mount_target(&self) -> Result<String> {
        Ok(normalize_id(&self.config.mount_target)?)
    }

    fn expect_phase(&self, expected: BootPhase, step: KernelLifecyclePhase) -> Result<()> {
        if self.phase == expected {
            return Ok(());
        }
        Err(Error::KernelLifecycleError {
            phase: step,
            component_name: None,
            message: format!("cannot run {step} while {} (expected {expected})", self.phase),
            source: None,
        })
    }

    fn fail(&mut self, step: KernelLifecyclePhase, error: Error) -> Error {
        log::error!("Startup failed during {}: {}", step, error);
        self.phase = BootPhase::Failed(step);
        self.context = None;
        match error {
            // Already describes the failing phase
            e @ Error::KernelLifecycleError { .. } => e,
            e => Error::lifecycle(step, "startup step failed", e),
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("phase", &self.phase)
            .field("store", &self.schema.name)
            .field("mount_target", &self.config.mount_target)
            .field("components", &self.dependencies.len())
            .field("capabilities", &self.capabilities.capabilities())
            .finish()
    }
}
