//! Service container used to wire the application at startup
//!
//! Installers register factories into a [`ServiceCollection`], keyed by the
//! service type. The type may be a concrete struct or a trait object such as
//! `dyn AuthService`. Once registration is finished the collection is frozen
//! into a [`ServiceProvider`], and every unit of work (typically one HTTP
//! request) opens its own [`ServiceScope`] to resolve services from.
//!
//! ```rust
//! use std::sync::Arc;
//! use common::container::ServiceCollection;
//!
//! struct Greeter(&'static str);
//!
//! let mut services = ServiceCollection::new();
//! services.add_scoped::<Greeter, _>(|_| Ok(Arc::new(Greeter("hello"))));
//!
//! let provider = services.build();
//! let scope = provider.create_scope();
//! let greeter = scope.resolve::<Greeter>().unwrap();
//! assert_eq!(greeter.0, "hello");
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{ContainerError, ContainerResult};

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceScope) -> ContainerResult<Instance> + Send + Sync>;

/// How long a resolved instance lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// One instance for the lifetime of the provider
    Singleton,
    /// One instance per scope
    Scoped,
    /// A new instance on every resolution
    Transient,
}

#[derive(Clone)]
struct ServiceDescriptor {
    lifetime: ServiceLifetime,
    type_name: &'static str,
    factory: Factory,
}

/// Mutable registration target filled in by installers
#[derive(Clone, Default)]
pub struct ServiceCollection {
    descriptors: HashMap<TypeId, ServiceDescriptor>,
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.descriptors.values().map(|d| (d.type_name, d.lifetime)))
            .finish()
    }
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service built once and shared by every scope
    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceScope) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Singleton, factory)
    }

    /// Register a service built once per scope
    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceScope) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Scoped, factory)
    }

    /// Register a service built on every resolution
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceScope) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Transient, factory)
    }

    /// Register an existing instance as a singleton
    pub fn add_instance<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.add_singleton::<T, _>(move |_| Ok(Arc::clone(&instance)))
    }

    /// Register `factory` for `T`, replacing any earlier registration
    pub fn add<T, F>(&mut self, lifetime: ServiceLifetime, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceScope) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        let type_name = type_name::<T>();
        let erased: Factory = Arc::new(move |scope: &ServiceScope| {
            let service = factory(scope)?;
            Ok(Arc::new(service) as Instance)
        });

        let previous = self.descriptors.insert(
            TypeId::of::<T>(),
            ServiceDescriptor {
                lifetime,
                type_name,
                factory: erased,
            },
        );

        if previous.is_some() {
            debug!("Replaced registration for {} ({:?})", type_name, lifetime);
        } else {
            trace!("Registered {} ({:?})", type_name, lifetime);
        }

        self
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.descriptors.contains_key(&TypeId::of::<T>())
    }

    pub fn lifetime_of<T: ?Sized + 'static>(&self) -> Option<ServiceLifetime> {
        self.descriptors
            .get(&TypeId::of::<T>())
            .map(|descriptor| descriptor.lifetime)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Freeze the registrations into a provider
    pub fn build(self) -> ServiceProvider {
        debug!("Building service provider with {} service(s)", self.len());
        ServiceProvider {
            inner: Arc::new(ProviderInner {
                descriptors: self.descriptors,
                singletons: Mutex::new(HashMap::new()),
            }),
        }
    }
}

struct ProviderInner {
    descriptors: HashMap<TypeId, ServiceDescriptor>,
    singletons: Mutex<HashMap<TypeId, Instance>>,
}

/// Resolver shared by every scope
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.inner.descriptors.len())
            .finish()
    }
}

impl ServiceProvider {
    /// Open a new unit of work
    pub fn create_scope(&self) -> ServiceScope {
        let scope = ServiceScope {
            id: Uuid::new_v4(),
            provider: Arc::clone(&self.inner),
            instances: Arc::new(Mutex::new(HashMap::new())),
        };
        trace!("Opened service scope {}", scope.id);
        scope
    }

    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.inner.descriptors.contains_key(&TypeId::of::<T>())
    }
}

/// One unit of work; clones share the same scoped instances
#[derive(Clone)]
pub struct ServiceScope {
    id: Uuid,
    provider: Arc<ProviderInner>,
    instances: Arc<Mutex<HashMap<TypeId, Instance>>>,
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope").field("id", &self.id).finish()
    }
}

impl ServiceScope {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Resolve `T`, building it if the lifetime requires
    pub fn resolve<T>(&self) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();
        let descriptor = self
            .provider
            .descriptors
            .get(&key)
            .ok_or(ContainerError::NotRegistered(type_name::<T>()))?;

        let instance = match descriptor.lifetime {
            ServiceLifetime::Transient => (descriptor.factory)(self)?,
            ServiceLifetime::Scoped => self.cached(&self.instances, key, descriptor)?,
            ServiceLifetime::Singleton => self.cached(&self.provider.singletons, key, descriptor)?,
        };

        downcast::<T>(instance)
    }

    /// Resolve `T` if it has been registered
    pub fn try_resolve<T>(&self) -> ContainerResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.resolve::<T>() {
            Ok(service) => Ok(Some(service)),
            Err(ContainerError::NotRegistered(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // The factory runs with the cache unlocked so it can resolve its own
    // dependencies; if two callers race, the first stored instance wins.
    fn cached(
        &self,
        cache: &Mutex<HashMap<TypeId, Instance>>,
        key: TypeId,
        descriptor: &ServiceDescriptor,
    ) -> ContainerResult<Instance> {
        if let Some(instance) = lock(cache).get(&key) {
            return Ok(Arc::clone(instance));
        }

        let built = (descriptor.factory)(self)?;
        trace!("Built {} for scope {}", descriptor.type_name, self.id);

        let mut instances = lock(cache);
        Ok(Arc::clone(instances.entry(key).or_insert(built)))
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn downcast<T>(instance: Instance) -> ContainerResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<T>>()
        .map(Arc::clone)
        .ok_or_else(|| ContainerError::construction::<T>("registered instance has a different type"))
}
