//! # Mediator Configuration
//!
//! Runtime knobs for dispatch. Every field has a default, so an empty configuration is
//! valid; values can be overridden from a file and from `ARBITER__*` environment
//! variables (see [`MediatorConfig::load`]).
//!
//! ```toml
//! publish_strategy = "spawned"     # concurrent | spawned | sequential
//! handler_resolution = "frozen"    # dynamic | frozen
//! log_dispatch = true
//! ```

mod loader;

use serde::{Deserialize, Serialize};

pub use loader::ENV_PREFIX;

/// How `publish` drives the handlers of one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStrategy {
    /// Start every handler future in registration order and drive them together until
    /// all have finished; the first failure in start order is returned.
    #[default]
    Concurrent,
    /// Run each handler on its own tokio task. After the first failure is returned the
    /// remaining tasks still run to completion in the background.
    Spawned,
    /// Run handlers one after another; the first failure stops the fan-out.
    Sequential,
}

/// Where runtime-typed dispatch looks up handler wrappers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerResolution {
    /// Use the frozen snapshot when one is current, otherwise the live map.
    #[default]
    Dynamic,
    /// Always read through the frozen snapshot, rebuilding it after writes.
    Frozen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    pub publish_strategy: PublishStrategy,
    pub handler_resolution: HandlerResolution,
    /// Emit a debug event for every send/publish
    pub log_dispatch: bool,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            publish_strategy: PublishStrategy::Concurrent,
            handler_resolution: HandlerResolution::Dynamic,
            log_dispatch: true,
        }
    }
}

impl MediatorConfig {
    pub fn with_publish_strategy(mut self, publish_strategy: PublishStrategy) -> Self {
        self.publish_strategy = publish_strategy;
        self
    }

    pub fn with_handler_resolution(mut self, handler_resolution: HandlerResolution) -> Self {
        self.handler_resolution = handler_resolution;
        self
    }

    pub fn with_log_dispatch(mut self, log_dispatch: bool) -> Self {
        self.log_dispatch = log_dispatch;
        self
    }
}
