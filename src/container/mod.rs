//! # Service Resolution Boundary
//!
//! The mediator never constructs handlers or behaviors itself. It asks a
//! [`ServiceProvider`] for them, keyed by the closed trait-object type it needs
//! (`dyn RequestHandler<Ping>`, `dyn PipelineBehavior<Ping>`, ...).
//!
//! Any container can sit behind the trait. [`ServiceCollection`] and
//! [`ServiceContainer`] are a small implementation with singleton and transient
//! lifetimes, enough for applications that do not already bring their own.
//!
//! ## Usage
//!
//! ```rust
//! use arbiter_core::container::{ServiceCollection, ServiceProviderExt};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton::<dyn Clock>(Arc::new(FixedClock));
//!
//! let container = services.build();
//! let clock = container.get_required_service::<dyn Clock>().unwrap();
//! assert_eq!(clock.now(), 42);
//! ```

mod collection;

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::{MediatorError, Result};

pub use collection::{ServiceCollection, ServiceContainer, ServiceLifetime};

/// A resolved service. Holds an `Arc<T>` for the service type `T` it was registered as.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Supplies service instances by type key.
pub trait ServiceProvider: Send + Sync {
    /// Resolve zero or one instance. When several registrations exist for the key, the
    /// most recent one wins.
    fn resolve(&self, service: TypeId) -> Option<ServiceInstance>;

    /// Resolve every registration for the key, in registration order.
    fn resolve_all(&self, service: TypeId) -> Vec<ServiceInstance>;
}

/// Typed access on top of [`ServiceProvider`].
pub trait ServiceProviderExt: ServiceProvider {
    fn get_service<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve(TypeId::of::<T>())
            .and_then(|instance| instance.downcast_ref::<Arc<T>>().cloned())
    }

    fn get_required_service<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_service::<T>()
            .ok_or(MediatorError::ServiceNotFound {
                service: std::any::type_name::<T>(),
            })
    }

    fn get_services<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_all(TypeId::of::<T>())
            .into_iter()
            .filter_map(|instance| instance.downcast_ref::<Arc<T>>().cloned())
            .collect()
    }
}

impl<P: ServiceProvider + ?Sized> ServiceProviderExt for P {}
