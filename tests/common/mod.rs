//! Shared fixtures for the integration suites.
#![allow(dead_code)]

pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use arbiter_core::{
    Mediator, MediatorConfig, MediatorError, MediatorRegistry, Next, Notification,
    NotificationHandler, PipelineBehavior, Request, RequestHandler, Result, ServiceCollection,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Ordered record of side effects observed during a test.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    pub message: String,
}

impl Ping {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    pub message: String,
}

impl Request for Ping {
    type Response = Pong;
}

/// Answers `Ping { message }` with `Pong { message: "{message} Pong" }`.
pub struct PingHandler {
    pub log: EventLog,
}

#[async_trait]
impl RequestHandler<Ping> for PingHandler {
    async fn handle(&self, request: &Ping, _token: CancellationToken) -> Result<Pong> {
        self.log.push("handler");
        Ok(Pong {
            message: format!("{} Pong", request.message),
        })
    }
}

/// Records `"{label} before"` and `"{label} after"` around the continuation.
pub struct NamedBehavior {
    pub label: &'static str,
    pub log: EventLog,
}

#[async_trait]
impl PipelineBehavior<Ping> for NamedBehavior {
    async fn handle(
        &self,
        _request: &Ping,
        next: Next<'_, Ping>,
        token: CancellationToken,
    ) -> Result<Pong> {
        self.log.push(format!("{} before", self.label));
        let response = next.run(token).await?;
        self.log.push(format!("{} after", self.label));
        Ok(response)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("request rejected: {0}")]
pub struct RejectedError(pub String);

/// Fails requests whose message is `"Throw"` before reaching its continuation.
pub struct ThrowingBehavior;

#[async_trait]
impl PipelineBehavior<Ping> for ThrowingBehavior {
    async fn handle(
        &self,
        request: &Ping,
        next: Next<'_, Ping>,
        token: CancellationToken,
    ) -> Result<Pong> {
        if request.message == "Throw" {
            return Err(MediatorError::handler(RejectedError(request.message.clone())));
        }
        next.run(token).await
    }
}

/// Answers every request itself without calling the rest of the chain.
pub struct ShortCircuitBehavior {
    pub log: EventLog,
}

#[async_trait]
impl PipelineBehavior<Ping> for ShortCircuitBehavior {
    async fn handle(
        &self,
        _request: &Ping,
        _next: Next<'_, Ping>,
        _token: CancellationToken,
    ) -> Result<Pong> {
        self.log.push("short-circuit");
        Ok(Pong {
            message: "cached".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Pinged {
    pub message: String,
}

impl Notification for Pinged {}

/// Records `"{label}: {message}"` after an optional delay.
pub struct PingedHandler {
    pub label: &'static str,
    pub delay: Duration,
    pub log: EventLog,
}

#[async_trait]
impl NotificationHandler<Pinged> for PingedHandler {
    async fn handle(&self, notification: &Pinged, _token: CancellationToken) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.log
            .push(format!("{}: {}", self.label, notification.message));
        Ok(())
    }
}

/// Records `"{label} failed"` then fails with [`RejectedError`].
pub struct FailingPingedHandler {
    pub label: &'static str,
    pub log: EventLog,
}

#[async_trait]
impl NotificationHandler<Pinged> for FailingPingedHandler {
    async fn handle(&self, notification: &Pinged, _token: CancellationToken) -> Result<()> {
        self.log.push(format!("{} failed", self.label));
        Err(MediatorError::handler(RejectedError(
            notification.message.clone(),
        )))
    }
}

/// Mediator over `services` with a private registry.
pub fn build_mediator(services: ServiceCollection, config: MediatorConfig) -> Mediator {
    let registry = Arc::new(MediatorRegistry::new());
    registry.register(services.handler_entries());
    Mediator::with_config(Arc::new(services.build()), registry, config)
}
