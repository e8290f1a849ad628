use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use async_trait::async_trait;
use crate::kernel::error::{Error, Result};

/// Lifecycle trait for every process-wide handle published by the kernel
#[async_trait]
pub trait KernelComponent: Any + Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Called once, right after the component is published.
    async fn initialize(&self) -> Result<()>;
}

/// Registry storing exactly one `Arc<dyn KernelComponent>` per concrete type
#[derive(Default, Debug)]
pub struct DependencyRegistry {
    // Keyed by the *concrete* type's TypeId
    instances: HashMap<TypeId, Arc<dyn KernelComponent>>,
    // Same instances, kept as `Any` for downcasting
    concrete: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    // Publication order, used for initialization
    order: Vec<TypeId>,
}

impl DependencyRegistry {
    /// Create a new empty dependency registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component instance, keyed by the TypeId of the concrete type V.
    ///
    /// A second instance of the same type is rejected.
    pub fn register_instance<V>(&mut self, instance: Arc<V>) -> Result<()>
    where
        V: KernelComponent + 'static,
    {
        let type_id = TypeId::of::<V>();
        if self.instances.contains_key(&type_id) {
            return Err(Error::ComponentRegistryError {
                operation: "RegisterInstance".to_string(),
                component_name: Some(instance.name().to_string()),
                message: "An instance of this component is already registered".to_string(),
            });
        }
        log::debug!("Registering component: {}", instance.name());
        self.concrete.insert(type_id, instance.clone());
        self.instances.insert(type_id, instance);
        self.order.push(type_id);
        Ok(())
    }

    /// Get a component instance by concrete type T.
    pub fn get_concrete<T: KernelComponent + 'static>(&self) -> Option<Arc<T>> {
        self.concrete
            .get(&TypeId::of::<T>())
            .and_then(|arc_any| Arc::downcast::<T>(arc_any.clone()).ok())
    }

    /// Like [`get_concrete`](Self::get_concrete), but a missing component is an error.
    pub fn require<T: KernelComponent + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get_concrete::<T>().ok_or_else(|| Error::ComponentRegistryError {
            operation: "Require".to_string(),
            component_name: Some(name.to_string()),
            message: "Component has not been published".to_string(),
        })
    }

    /// Components in publication order.
    pub fn components_in_order(&self) -> Vec<Arc<dyn KernelComponent>> {
        self.order
            .iter()
            .filter_map(|id| self.instances.get(id).cloned())
            .collect()
    }

    /// Number of published components.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
