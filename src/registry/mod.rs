//! # Handler Registry
//!
//! Process-wide directory from a request's runtime type to a type-erased invoker, used
//! by runtime-typed dispatch ([`Mediator::send_dyn`](crate::Mediator::send_dyn)).
//!
//! ## Overview
//!
//! Typed dispatch (`Mediator::send::<R>`) knows `R` at compile time and needs no
//! registry. When the caller only holds a `Box<dyn AnyRequest>`, the mediator looks up
//! the [`RequestHandlerBase`] registered for the request's `TypeId`, which downcasts
//! the request and runs the typed pipeline.
//!
//! ## Architecture
//!
//! ```text
//! MediatorRegistry
//! ├── live map        DashMap<TypeId, Arc<dyn RequestHandlerBase>>   (writes)
//! ├── frozen cache    ArcSwapOption<FrozenCache>                     (lock-free reads)
//! └── generation      AtomicU64, bumped on every write
//! ```
//!
//! Writes go to the live map and invalidate the frozen cache. The next
//! [`MediatorRegistry::get_frozen_cache`] copies the live map into a new immutable
//! snapshot and installs it with a compare-and-swap; concurrent rebuilders agree on a
//! single installed snapshot.
//!
//! ## Usage
//!
//! ```rust
//! use arbiter_core::registry::{handler_entry, MediatorRegistry};
//! use arbiter_core::Request;
//! use std::any::TypeId;
//!
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = ();
//! }
//!
//! let registry = MediatorRegistry::new();
//! registry.register([handler_entry::<Ping>()]);
//!
//! assert!(registry.try_get_handler(TypeId::of::<Ping>()).is_some());
//! assert_eq!(registry.get_frozen_cache().len(), 1);
//! ```

mod handler_wrapper;
mod mediator_registry;

pub use handler_wrapper::{handler_entry, RequestHandlerBase, RequestHandlerWrapper};
pub use mediator_registry::{FrozenCache, MediatorRegistry, RegistryStats};
