//! Error types for mediator dispatch.
//!
//! Handler and behavior failures travel as [`MediatorError::Handler`] and are returned to
//! the caller exactly as the handler produced them. The remaining variants describe
//! configuration problems detected by the core itself.

use thiserror::Error;

/// Boxed error produced by user handlers and behaviors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum MediatorError {
    /// The service provider has no registration for a required service.
    #[error("Required service not registered: {service}")]
    ServiceNotFound { service: &'static str },

    /// A type-erased request did not match the handler wrapper it was routed to.
    #[error("Invalid request for {request_type}: {reason}")]
    InvalidRequest {
        request_type: &'static str,
        reason: String,
    },

    /// Failure raised by a request handler, notification handler or pipeline behavior.
    #[error(transparent)]
    Handler(BoxError),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Request {request_type} timed out after {timeout_ms}ms")]
    Timeout {
        request_type: &'static str,
        timeout_ms: u64,
    },

    #[error("Notification handler for {notification_type} panicked: {reason}")]
    HandlerPanicked {
        notification_type: &'static str,
        reason: String,
    },

    #[error("Unknown request type: {type_name}")]
    UnknownRequestType { type_name: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MediatorError {
    /// Wrap an arbitrary handler failure.
    pub fn handler<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        MediatorError::Handler(error.into())
    }

    /// Recover the concrete error a handler or behavior failed with.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            MediatorError::Handler(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Whether rerunning the same request could succeed.
    ///
    /// Timeouts and handler failures are transient; configuration, cancellation and
    /// decoding failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediatorError::Handler(_) | MediatorError::Timeout { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MediatorError::Cancelled)
    }
}

impl From<config::ConfigError> for MediatorError {
    fn from(error: config::ConfigError) -> Self {
        MediatorError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MediatorError>;
