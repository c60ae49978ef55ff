//! # Pipeline Behaviors
//!
//! Middleware wrapped around a request handler. Behaviors registered for a request type
//! form an onion around its handler: the first registered behavior is the outermost
//! layer, so it runs first on the way in and last on the way out.
//!
//! ```text
//! send(request)
//!   └─ B1 before
//!        └─ B2 before
//!             └─ handler
//!        └─ B2 after
//!   └─ B1 after
//! ```
//!
//! A behavior decides what to do with its [`Next`] continuation: skip it
//! (short-circuit), run it once, run it repeatedly (retry), or run it with a different
//! request (input transformation). The chain is rebuilt on every dispatch from the
//! behaviors the service provider resolves for that call.

mod chain;

pub mod behaviors;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::messages::Request;

pub use chain::{execute_pipeline, Next};

/// Middleware around the handler of request type `R`.
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        token: CancellationToken,
    ) -> Result<R::Response>;
}
