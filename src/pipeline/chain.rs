//! Per-call construction and execution of the behavior chain.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::PipelineBehavior;
use crate::container::{ServiceProvider, ServiceProviderExt};
use crate::error::Result;
use crate::handlers::RequestHandler;
use crate::messages::Request;

/// Continuation to the rest of the chain.
///
/// Holds the behaviors that have not run yet (outermost first) and the terminal
/// handler. Running it invokes the next behavior, or the handler once no behaviors
/// remain, so behaviors and the handler share one calling shape.
pub struct Next<'a, R: Request> {
    request: &'a R,
    behaviors: &'a [Arc<dyn PipelineBehavior<R>>],
    handler: &'a dyn RequestHandler<R>,
}

impl<'a, R: Request> Next<'a, R> {
    pub fn new(
        request: &'a R,
        behaviors: &'a [Arc<dyn PipelineBehavior<R>>],
        handler: &'a dyn RequestHandler<R>,
    ) -> Self {
        Self {
            request,
            behaviors,
            handler,
        }
    }

    /// Run the rest of the chain with the request this link received.
    ///
    /// May be called more than once.
    pub async fn run(&self, token: CancellationToken) -> Result<R::Response> {
        self.run_with(self.request, token).await
    }

    /// Run the rest of the chain with a substitute request.
    pub async fn run_with(&self, request: &R, token: CancellationToken) -> Result<R::Response> {
        match self.behaviors.split_first() {
            Some((behavior, inner)) => {
                let next = Next {
                    request,
                    behaviors: inner,
                    handler: self.handler,
                };
                behavior.handle(request, next, token).await
            }
            None => self.handler.handle(request, token).await,
        }
    }

    /// Number of behaviors still between this link and the handler.
    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }
}

impl<R: Request> Clone for Next<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Request> Copy for Next<'_, R> {}

/// Resolve the handler and behaviors for `R` and run the chain once.
///
/// The handler is resolved before any behavior, so a missing registration fails
/// without running user code.
pub async fn execute_pipeline<R: Request>(
    provider: &dyn ServiceProvider,
    request: &R,
    token: CancellationToken,
) -> Result<R::Response> {
    let handler = provider.get_required_service::<dyn RequestHandler<R>>()?;
    let behaviors = provider.get_services::<dyn PipelineBehavior<R>>();

    debug!(
        request_type = std::any::type_name::<R>(),
        behavior_count = behaviors.len(),
        "Executing request pipeline"
    );

    Next::new(request, &behaviors, handler.as_ref())
        .run(token)
        .await
}
