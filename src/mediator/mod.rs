//! # Mediator
//!
//! Single entry point that turns a request or notification value into handler
//! execution.
//!
//! ## Overview
//!
//! - [`Mediator::send`] - typed dispatch: resolves the one `RequestHandler<R>` and the
//!   `PipelineBehavior<R>`s for the call, runs the onion chain, returns the response
//! - [`Mediator::send_dyn`] - the same for a `Box<dyn AnyRequest>` whose concrete type
//!   is found at runtime through the [`MediatorRegistry`]
//! - [`Mediator::publish`] - fan-out to every `NotificationHandler<N>`; no handlers is
//!   not an error
//!
//! The mediator keeps no mutable state of its own and is cheap to clone; one instance
//! can serve any number of concurrent callers.
//!
//! ## Usage
//!
//! ```rust
//! use arbiter_core::container::ServiceCollection;
//! use arbiter_core::{Mediator, MediatorRegistry, Request, RequestHandler, Result};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ping(String);
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
//!         Ok(format!("{} Pong", request.0))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let mut services = ServiceCollection::new();
//! services.add_request_handler::<Ping, _>(PingHandler);
//!
//! let mediator = Mediator::with_registry(
//!     Arc::new(services.build()),
//!     Arc::new(MediatorRegistry::new()),
//! );
//!
//! let pong = mediator.send(Ping("hi".into()), CancellationToken::new()).await?;
//! assert_eq!(pong, "hi Pong");
//! # Ok(())
//! # }
//! ```

mod publish;

use std::any::Any;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::{HandlerResolution, MediatorConfig, PublishStrategy};
use crate::container::{ServiceProvider, ServiceProviderExt};
use crate::error::Result;
use crate::handlers::NotificationHandler;
use crate::messages::{AnyRequest, Notification, Request};
use crate::pipeline::execute_pipeline;
use crate::registry::{MediatorRegistry, RequestHandlerBase};

/// Dispatch façade over a [`ServiceProvider`].
#[derive(Clone)]
pub struct Mediator {
    provider: Arc<dyn ServiceProvider>,
    registry: Arc<MediatorRegistry>,
    config: MediatorConfig,
}

impl Mediator {
    /// Create a mediator using the process-wide registry and default configuration.
    pub fn new(provider: Arc<dyn ServiceProvider>) -> Self {
        Self::with_config(provider, MediatorRegistry::global(), MediatorConfig::default())
    }

    pub fn with_registry(
        provider: Arc<dyn ServiceProvider>,
        registry: Arc<MediatorRegistry>,
    ) -> Self {
        Self::with_config(provider, registry, MediatorConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn ServiceProvider>,
        registry: Arc<MediatorRegistry>,
        config: MediatorConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    pub fn provider(&self) -> &Arc<dyn ServiceProvider> {
        &self.provider
    }

    pub fn registry(&self) -> &Arc<MediatorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Send a request to its handler through the registered pipeline behaviors.
    ///
    /// Fails with [`MediatorError::ServiceNotFound`](crate::MediatorError::ServiceNotFound)
    /// before any behavior runs when no handler is registered for `R`. Failures from
    /// the handler or a behavior are returned as they were raised.
    #[instrument(
        level = "debug",
        skip_all,
        fields(request_type = std::any::type_name::<R>())
    )]
    pub async fn send<R: Request>(&self, request: R, token: CancellationToken) -> Result<R::Response> {
        if self.config.log_dispatch {
            debug!("Dispatching request");
        }
        execute_pipeline(self.provider.as_ref(), &request, token).await
    }

    /// Send a request whose concrete type is only known at runtime.
    ///
    /// The response is boxed; downcast it to the request's `Response` type.
    #[instrument(
        level = "debug",
        skip_all,
        fields(request_type = request.request_type_name())
    )]
    pub async fn send_dyn(
        &self,
        request: Box<dyn AnyRequest>,
        token: CancellationToken,
    ) -> Result<Box<dyn Any + Send>> {
        if self.config.log_dispatch {
            debug!(resolution = ?self.config.handler_resolution, "Dispatching runtime-typed request");
        }
        let handler = self.resolve_wrapper(&*request);
        handler.handle(request, self.provider.as_ref(), token).await
    }

    /// Publish a notification to every handler registered for `N`.
    ///
    /// Handlers start in registration order. With the default strategy they run
    /// concurrently and the first failure, in start order, is returned.
    #[instrument(
        level = "debug",
        skip_all,
        fields(notification_type = std::any::type_name::<N>())
    )]
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
        token: CancellationToken,
    ) -> Result<()> {
        let handlers = self.provider.get_services::<dyn NotificationHandler<N>>();
        if handlers.is_empty() {
            debug!("No notification handlers registered");
            return Ok(());
        }

        if self.config.log_dispatch {
            debug!(
                handler_count = handlers.len(),
                strategy = ?self.config.publish_strategy,
                "Publishing notification"
            );
        }

        match self.config.publish_strategy {
            PublishStrategy::Concurrent => {
                publish::concurrent(&handlers, &notification, token).await
            }
            PublishStrategy::Spawned => publish::spawned(handlers, notification, token).await,
            PublishStrategy::Sequential => {
                publish::sequential(&handlers, &notification, token).await
            }
        }
    }

    fn resolve_wrapper(&self, request: &dyn AnyRequest) -> Arc<dyn RequestHandlerBase> {
        let request_type = request.request_type_id();
        let cached = match self.config.handler_resolution {
            HandlerResolution::Dynamic => self.registry.try_get_handler(request_type),
            HandlerResolution::Frozen => self
                .registry
                .get_frozen_cache()
                .get(&request_type)
                .cloned(),
        };

        cached.unwrap_or_else(|| {
            self.registry
                .get_or_add(request_type, |_| request.handler_wrapper())
        })
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceCollection;
    use crate::error::MediatorError;
    use crate::handlers::RequestHandler;
    use async_trait::async_trait;
    use std::any::TypeId;

    struct Square(u32);

    impl Request for Square {
        type Response = u32;
    }

    struct SquareHandler;

    #[async_trait]
    impl RequestHandler<Square> for SquareHandler {
        async fn handle(&self, request: &Square, _token: CancellationToken) -> Result<u32> {
            Ok(request.0 * request.0)
        }
    }

    struct Unhandled;

    impl Request for Unhandled {
        type Response = ();
    }

    fn mediator(config: MediatorConfig) -> Mediator {
        let mut services = ServiceCollection::new();
        services.add_request_handler::<Square, _>(SquareHandler);
        Mediator::with_config(
            Arc::new(services.build()),
            Arc::new(MediatorRegistry::new()),
            config,
        )
    }

    #[tokio::test]
    async fn test_send_typed() {
        let mediator = mediator(MediatorConfig::default());
        let result = mediator
            .send(Square(7), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result, 49);
    }

    #[tokio::test]
    async fn test_send_without_handler_fails() {
        let mediator = mediator(MediatorConfig::default());
        let error = mediator
            .send(Unhandled, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, MediatorError::ServiceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_send_dyn_adds_wrapper_on_first_use() {
        let mediator = mediator(MediatorConfig::default());
        assert!(mediator.registry().is_empty());

        let response = mediator
            .send_dyn(Box::new(Square(3)), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*response.downcast::<u32>().unwrap(), 9);
        assert!(mediator.registry().contains(TypeId::of::<Square>()));
    }

    #[tokio::test]
    async fn test_send_dyn_with_frozen_resolution() {
        let config = MediatorConfig::default().with_handler_resolution(HandlerResolution::Frozen);
        let mediator = mediator(config);

        for value in 1..=3u32 {
            let response = mediator
                .send_dyn(Box::new(Square(value)), CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(*response.downcast::<u32>().unwrap(), value * value);
        }

        let frozen = mediator.registry().get_frozen_cache();
        assert!(frozen.contains(&TypeId::of::<Square>()));
        assert_eq!(mediator.registry().count(), 1);
    }

    #[tokio::test]
    async fn test_send_dyn_without_handler_fails() {
        let mediator = mediator(MediatorConfig::default());
        let error = mediator
            .send_dyn(Box::new(Unhandled), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, MediatorError::ServiceNotFound { .. }));
    }
}
