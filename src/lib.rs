#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Arbiter Core
//!
//! In-process mediator: typed request/response dispatch through a configurable chain
//! of pipeline behaviors, and fan-out of notifications to any number of handlers.
//!
//! ## Overview
//!
//! Callers hand a message to the [`Mediator`] instead of calling the code that handles
//! it. Handlers and behaviors are resolved per call from a
//! [`ServiceProvider`](container::ServiceProvider), so the caller never names them.
//!
//! - A [`Request`] has exactly one [`RequestHandler`] and produces a response
//! - A [`Notification`] has zero or more [`NotificationHandler`]s and produces nothing
//! - [`PipelineBehavior`]s wrap a request's handler like layers of an onion
//!
//! ## Module Organization
//!
//! - [`messages`] - request and notification marker traits
//! - [`handlers`] - request and notification handler contracts
//! - [`pipeline`] - behavior contract, chain execution and built-in behaviors
//! - [`container`] - service provider boundary and a small built-in container
//! - [`registry`] - runtime-typed handler wrappers and the frozen lookup cache
//! - [`mediator`] - the dispatch façade
//! - [`wire`] - JSON dispatch by request type name
//! - [`config`] - dispatch configuration
//! - [`error`] - structured error handling
//! - [`logging`] - tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust
//! use arbiter_core::container::ServiceCollection;
//! use arbiter_core::{Mediator, MediatorRegistry, Request, RequestHandler, Result};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ping {
//!     message: String,
//! }
//!
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, request: &Ping, _token: CancellationToken) -> Result<String> {
//!         Ok(format!("{} Pong", request.message))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let mut services = ServiceCollection::new();
//! services.add_request_handler::<Ping, _>(PingHandler);
//!
//! let registry = Arc::new(MediatorRegistry::new());
//! registry.register(services.handler_entries());
//!
//! let mediator = Mediator::with_registry(Arc::new(services.build()), registry);
//! let response = mediator
//!     .send(Ping { message: "Ping".into() }, CancellationToken::new())
//!     .await?;
//! assert_eq!(response, "Ping Pong");
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod mediator;
pub mod messages;
pub mod pipeline;
pub mod registry;
pub mod wire;

pub use config::{HandlerResolution, MediatorConfig, PublishStrategy};
pub use container::{ServiceCollection, ServiceContainer, ServiceProvider, ServiceProviderExt};
pub use error::{BoxError, MediatorError, Result};
pub use handlers::{NotificationHandler, RequestHandler};
pub use mediator::Mediator;
pub use messages::{AnyRequest, Notification, Request};
pub use pipeline::{Next, PipelineBehavior};
pub use registry::{FrozenCache, MediatorRegistry, RegistryStats};
pub use wire::RequestCatalog;
