//! # Request Catalog
//!
//! Dispatch of JSON payloads by request type name, for callers that receive requests
//! over a transport and cannot name the Rust type at compile time.
//!
//! A catalog maps a stable name (`"ping"`, `"orders.create"`, ...) to a decoder for
//! the request type and an encoder for its response. [`RequestCatalog::dispatch`]
//! decodes the payload, routes it through [`Mediator::send_dyn`] and encodes the
//! response back to JSON.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{MediatorError, Result};
use crate::logging::log_dispatch_operation;
use crate::mediator::Mediator;
use crate::messages::{AnyRequest, Request};

type Decoder = Box<dyn Fn(Value) -> Result<Box<dyn AnyRequest>> + Send + Sync>;
type Encoder = Box<dyn Fn(Box<dyn Any + Send>) -> Result<Value> + Send + Sync>;

struct CatalogEntry {
    request_type: &'static str,
    decode: Decoder,
    encode: Encoder,
}

/// Name-to-type map for JSON dispatch.
#[derive(Default)]
pub struct RequestCatalog {
    entries: RwLock<HashMap<String, Arc<CatalogEntry>>>,
}

impl RequestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register request type `R` under `name`.
    ///
    /// Returns `false` and keeps the existing entry when the name is taken.
    pub fn register<R>(&self, name: impl Into<String>) -> bool
    where
        R: Request + DeserializeOwned,
        R::Response: Serialize,
    {
        let name = name.into();
        let mut entries = self.entries.write();
        if entries.contains_key(&name) {
            warn!(
                type_name = %name,
                request_type = std::any::type_name::<R>(),
                "Request type name already registered"
            );
            return false;
        }

        let entry = CatalogEntry {
            request_type: std::any::type_name::<R>(),
            decode: Box::new(|payload: Value| -> Result<Box<dyn AnyRequest>> {
                let request: R = serde_json::from_value(payload)?;
                Ok(Box::new(request) as Box<dyn AnyRequest>)
            }),
            encode: Box::new(|response: Box<dyn Any + Send>| -> Result<Value> {
                let response = response.downcast::<R::Response>().map_err(|_| {
                    MediatorError::InvalidRequest {
                        request_type: std::any::type_name::<R>(),
                        reason: "handler returned an unexpected response type".to_string(),
                    }
                })?;
                Ok(serde_json::to_value(&*response)?)
            }),
        };

        debug!(
            type_name = %name,
            request_type = entry.request_type,
            "Registered request type"
        );
        entries.insert(name, Arc::new(entry));
        true
    }

    /// Decode `payload` as the request registered under `type_name`, send it and encode
    /// the response.
    pub async fn dispatch(
        &self,
        mediator: &Mediator,
        type_name: &str,
        payload: Value,
        token: CancellationToken,
    ) -> Result<Value> {
        let entry = self
            .entries
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| MediatorError::UnknownRequestType {
                type_name: type_name.to_string(),
            })?;

        let started = Instant::now();
        let result = match (entry.decode)(payload) {
            Ok(request) => match mediator.send_dyn(request, token).await {
                Ok(response) => (entry.encode)(response),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let status = if result.is_ok() { "ok" } else { "failed" };
        let details = result.as_ref().err().map(ToString::to_string);
        log_dispatch_operation(
            type_name,
            entry.request_type,
            status,
            Some(started.elapsed().as_millis() as u64),
            details.as_deref(),
        );
        result
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.read().contains_key(type_name)
    }

    /// Registered names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for RequestCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCatalog")
            .field("type_names", &self.type_names())
            .finish()
    }
}
