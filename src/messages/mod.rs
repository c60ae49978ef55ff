//! # Messages
//!
//! The units of work that can be dispatched through the [`Mediator`](crate::Mediator).
//!
//! - [`Request`] - dispatched with `send`, answered by exactly one handler
//! - [`Notification`] - dispatched with `publish`, observed by zero or more handlers
//! - [`AnyRequest`] - a request whose concrete type is only known at runtime
//!
//! ## Usage
//!
//! ```rust
//! use arbiter_core::{Notification, Request};
//!
//! struct Ping {
//!     message: String,
//! }
//!
//! struct Pong {
//!     message: String,
//! }
//!
//! impl Request for Ping {
//!     type Response = Pong;
//! }
//!
//! #[derive(Clone)]
//! struct Pinged {
//!     message: String,
//! }
//!
//! impl Notification for Pinged {}
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::registry::{RequestHandlerBase, RequestHandlerWrapper};

/// A value dispatched through `send` that expects exactly one response.
///
/// The runtime type of the request is its dispatch key; the associated `Response`
/// fixes the type its single handler produces.
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// A value dispatched through `publish`. Produces no response.
pub trait Notification: Send + Sync + 'static {}

/// A request with its concrete type erased.
///
/// Implemented for every [`Request`]. Used when the caller only holds a boxed request,
/// for example one decoded from a wire payload by type name.
pub trait AnyRequest: Send + Sync + 'static {
    /// Dispatch key of the concrete request type.
    fn request_type_id(&self) -> TypeId;

    /// Concrete request type name, for errors and logs.
    fn request_type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    /// Build the typed invoker for this request's concrete type.
    ///
    /// Registries call this when they meet a request type for the first time.
    fn handler_wrapper(&self) -> Arc<dyn RequestHandlerBase>;
}

impl<R: Request> AnyRequest for R {
    fn request_type_id(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn request_type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn handler_wrapper(&self) -> Arc<dyn RequestHandlerBase> {
        Arc::new(RequestHandlerWrapper::<R>::new())
    }
}

impl std::fmt::Debug for dyn AnyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyRequest")
            .field("request_type", &self.request_type_name())
            .finish()
    }
}
