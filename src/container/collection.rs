//! In-memory service collection and the container built from it.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::{ServiceInstance, ServiceProvider};
use crate::handlers::{NotificationHandler, RequestHandler};
use crate::messages::{Notification, Request};
use crate::pipeline::PipelineBehavior;
use crate::registry::{RequestHandlerBase, RequestHandlerWrapper};

type InstanceFactory = Arc<dyn Fn() -> ServiceInstance + Send + Sync>;

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// One shared instance for every resolution
    Singleton,
    /// A new instance for every resolution
    Transient,
}

#[derive(Clone)]
enum ServiceSource {
    Instance(ServiceInstance),
    Factory(InstanceFactory),
}

#[derive(Clone)]
struct ServiceDescriptor {
    service_name: &'static str,
    lifetime: ServiceLifetime,
    source: ServiceSource,
}

impl ServiceDescriptor {
    fn instantiate(&self) -> ServiceInstance {
        match &self.source {
            ServiceSource::Instance(instance) => instance.clone(),
            ServiceSource::Factory(factory) => factory(),
        }
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service_name", &self.service_name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Mutable registration phase of the container.
///
/// Registrations for the same service type are kept in the order they were added;
/// that order is the order pipeline behaviors and notification handlers run in.
#[derive(Default)]
pub struct ServiceCollection {
    services: HashMap<TypeId, Vec<ServiceDescriptor>>,
    handler_entries: Vec<(TypeId, Arc<dyn RequestHandlerBase>)>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared instance of service type `T`.
    pub fn add_singleton<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance: ServiceInstance = Arc::new(instance);
        self.push::<T>(ServiceLifetime::Singleton, ServiceSource::Instance(instance))
    }

    /// Register a factory producing a fresh `T` on every resolution.
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let factory: InstanceFactory = Arc::new(move || -> ServiceInstance { Arc::new(factory()) });
        self.push::<T>(ServiceLifetime::Transient, ServiceSource::Factory(factory))
    }

    /// Register the handler for request type `R` as a singleton.
    pub fn add_request_handler<R, H>(&mut self, handler: H) -> &mut Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        self.add_singleton::<dyn RequestHandler<R>>(Arc::new(handler));
        self.record_handler_entry::<R>()
    }

    /// Register the handler for request type `R`, constructed per dispatch.
    pub fn add_request_handler_factory<R, H, F>(&mut self, factory: F) -> &mut Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.add_transient::<dyn RequestHandler<R>, _>(move || -> Arc<dyn RequestHandler<R>> {
            Arc::new(factory())
        });
        self.record_handler_entry::<R>()
    }

    /// Append a behavior to the pipeline of request type `R`.
    pub fn add_pipeline_behavior<R, B>(&mut self, behavior: B) -> &mut Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
    {
        self.add_singleton::<dyn PipelineBehavior<R>>(Arc::new(behavior))
    }

    /// Append a behavior constructed per dispatch to the pipeline of request type `R`.
    pub fn add_pipeline_behavior_factory<R, B, F>(&mut self, factory: F) -> &mut Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.add_transient::<dyn PipelineBehavior<R>, _>(move || -> Arc<dyn PipelineBehavior<R>> {
            Arc::new(factory())
        })
    }

    pub fn add_notification_handler<N, H>(&mut self, handler: H) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        self.add_singleton::<dyn NotificationHandler<N>>(Arc::new(handler))
    }

    pub fn add_notification_handler_factory<N, H, F>(&mut self, factory: F) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.add_transient::<dyn NotificationHandler<N>, _>(
            move || -> Arc<dyn NotificationHandler<N>> { Arc::new(factory()) },
        )
    }

    /// Whether any registration exists for service type `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Total number of registrations across all service types.
    pub fn len(&self) -> usize {
        self.services.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Handler wrappers for every request type that received a handler, in
    /// registration order. Feed these to
    /// [`MediatorRegistry::register`](crate::registry::MediatorRegistry::register) at
    /// startup so runtime-typed dispatch never builds wrappers lazily.
    pub fn handler_entries(&self) -> Vec<(TypeId, Arc<dyn RequestHandlerBase>)> {
        self.handler_entries.clone()
    }

    /// Freeze the registrations into a resolvable container.
    pub fn build(self) -> ServiceContainer {
        info!(
            service_types = self.services.len(),
            registrations = self.len(),
            request_handlers = self.handler_entries.len(),
            "Built service container"
        );

        ServiceContainer {
            services: self.services,
        }
    }

    fn push<T: ?Sized + 'static>(
        &mut self,
        lifetime: ServiceLifetime,
        source: ServiceSource,
    ) -> &mut Self {
        let service_name = std::any::type_name::<T>();
        debug!(service = service_name, ?lifetime, "Registering service");

        self.services
            .entry(TypeId::of::<T>())
            .or_default()
            .push(ServiceDescriptor {
                service_name,
                lifetime,
                source,
            });
        self
    }

    fn record_handler_entry<R: Request>(&mut self) -> &mut Self {
        self.handler_entries.push((
            TypeId::of::<R>(),
            Arc::new(RequestHandlerWrapper::<R>::new()),
        ));
        self
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("registrations", &self.len())
            .field("request_handlers", &self.handler_entries.len())
            .finish()
    }
}

/// Immutable container produced by [`ServiceCollection::build`].
#[derive(Debug)]
pub struct ServiceContainer {
    services: HashMap<TypeId, Vec<ServiceDescriptor>>,
}

impl ServiceContainer {
    /// Number of registrations for the given service type key.
    pub fn registration_count(&self, service: TypeId) -> usize {
        self.services.get(&service).map_or(0, Vec::len)
    }
}

impl ServiceProvider for ServiceContainer {
    fn resolve(&self, service: TypeId) -> Option<ServiceInstance> {
        self.services
            .get(&service)
            .and_then(|descriptors| descriptors.last())
            .map(ServiceDescriptor::instantiate)
    }

    fn resolve_all(&self, service: TypeId) -> Vec<ServiceInstance> {
        self.services
            .get(&service)
            .map(|descriptors| descriptors.iter().map(ServiceDescriptor::instantiate).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceProviderExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Named(&'static str);

    impl Greeter for Named {
        fn greet(&self) -> String {
            format!("hello from {}", self.0)
        }
    }

    #[test]
    fn test_singleton_resolves_same_instance() {
        let mut services = ServiceCollection::new();
        services.add_singleton::<dyn Greeter>(Arc::new(Named("a")));
        let container = services.build();

        let first = container.get_required_service::<dyn Greeter>().unwrap();
        let second = container.get_required_service::<dyn Greeter>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.greet(), "hello from a");
    }

    #[test]
    fn test_transient_invokes_factory_per_resolution() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();

        let mut services = ServiceCollection::new();
        services.add_transient::<dyn Greeter, _>(move || -> Arc<dyn Greeter> {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Named("transient"))
        });
        let container = services.build();

        let first = container.get_required_service::<dyn Greeter>().unwrap();
        let second = container.get_required_service::<dyn Greeter>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolve_returns_last_and_resolve_all_keeps_order() {
        let mut services = ServiceCollection::new();
        services
            .add_singleton::<dyn Greeter>(Arc::new(Named("first")))
            .add_singleton::<dyn Greeter>(Arc::new(Named("second")))
            .add_singleton::<dyn Greeter>(Arc::new(Named("third")));
        assert_eq!(services.len(), 3);
        let container = services.build();

        let single = container.get_required_service::<dyn Greeter>().unwrap();
        assert_eq!(single.greet(), "hello from third");

        let all: Vec<String> = container
            .get_services::<dyn Greeter>()
            .iter()
            .map(|greeter| greeter.greet())
            .collect();
        assert_eq!(
            all,
            vec!["hello from first", "hello from second", "hello from third"]
        );
        assert_eq!(container.registration_count(TypeId::of::<dyn Greeter>()), 3);
    }

    #[test]
    fn test_missing_required_service_is_an_error() {
        let container = ServiceCollection::new().build();

        let error = container.get_required_service::<dyn Greeter>().err().unwrap();
        assert!(error.to_string().contains("Greeter"));
        assert!(container.get_services::<dyn Greeter>().is_empty());
    }

    #[test]
    fn test_collection_tracks_contains() {
        let mut services = ServiceCollection::new();
        assert!(services.is_empty());
        assert!(!services.contains::<dyn Greeter>());

        services.add_singleton::<dyn Greeter>(Arc::new(Named("x")));
        assert!(services.contains::<dyn Greeter>());
    }
}
