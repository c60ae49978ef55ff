//! # Handler Contracts
//!
//! - [`RequestHandler`] - the single handler producing a response for one request type
//! - [`NotificationHandler`] - one of any number of reactions to a notification type
//!
//! Handlers are resolved from the [`ServiceProvider`](crate::container::ServiceProvider)
//! on every dispatch, so their lifetime (shared singleton or fresh per call) is decided
//! by how they were registered, not by the mediator.
//!
//! ## Usage
//!
//! ```rust
//! use arbiter_core::{Request, RequestHandler, Result};
//! use async_trait::async_trait;
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
//! ```

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::messages::{Notification, Request};

/// Produces the response for a request of type `R`.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Handle the request.
    ///
    /// Implementations should observe `token` and return
    /// [`MediatorError::Cancelled`](crate::MediatorError::Cancelled) once it fires.
    async fn handle(&self, request: &R, token: CancellationToken) -> Result<R::Response>;
}

/// Reacts to a published notification of type `N`.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    async fn handle(&self, notification: &N, token: CancellationToken) -> Result<()>;

    /// Handler name for diagnostics
    fn handler_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
