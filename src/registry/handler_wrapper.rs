//! Type-erased invokers for runtime-typed dispatch.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::container::ServiceProvider;
use crate::error::{MediatorError, Result};
use crate::messages::{AnyRequest, Request};
use crate::pipeline::execute_pipeline;

/// Non-generic entry point for one request type.
pub trait RequestHandlerBase: Send + Sync {
    /// The request type this invoker accepts.
    fn request_type_id(&self) -> TypeId;

    fn request_type_name(&self) -> &'static str;

    /// Downcast `request`, run the typed pipeline and box the response.
    fn handle<'a>(
        &'a self,
        request: Box<dyn AnyRequest>,
        provider: &'a dyn ServiceProvider,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Box<dyn Any + Send>>>;
}

/// Typed adapter implementing [`RequestHandlerBase`] for request type `R`.
pub struct RequestHandlerWrapper<R> {
    _request: PhantomData<fn() -> R>,
}

impl<R: Request> RequestHandlerWrapper<R> {
    pub fn new() -> Self {
        Self {
            _request: PhantomData,
        }
    }
}

impl<R: Request> Default for RequestHandlerWrapper<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Request> RequestHandlerBase for RequestHandlerWrapper<R> {
    fn request_type_id(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn request_type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn handle<'a>(
        &'a self,
        request: Box<dyn AnyRequest>,
        provider: &'a dyn ServiceProvider,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Box<dyn Any + Send>>> {
        let actual = request.request_type_name();
        let request = match request.into_any().downcast::<R>() {
            Ok(request) => request,
            Err(_) => {
                return future::ready(Err(MediatorError::InvalidRequest {
                    request_type: std::any::type_name::<R>(),
                    reason: format!("received {actual}"),
                }))
                .boxed();
            }
        };

        async move {
            let response = execute_pipeline::<R>(provider, &request, token).await?;
            Ok(Box::new(response) as Box<dyn Any + Send>)
        }
        .boxed()
    }
}

impl<R> std::fmt::Debug for RequestHandlerWrapper<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandlerWrapper")
            .field("request_type", &std::any::type_name::<R>())
            .finish()
    }
}

/// Registry entry for request type `R`, for bulk seeding at startup.
pub fn handler_entry<R: Request>() -> (TypeId, Arc<dyn RequestHandlerBase>) {
    (TypeId::of::<R>(), Arc::new(RequestHandlerWrapper::<R>::new()))
}
