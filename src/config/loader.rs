//! Layered configuration loading: defaults, then an optional file, then environment.

use std::path::Path;

use config::{Config, Environment, File};
use tracing::debug;

use super::MediatorConfig;
use crate::error::{MediatorError, Result};

/// Prefix of environment overrides, e.g. `ARBITER__PUBLISH_STRATEGY=spawned`.
pub const ENV_PREFIX: &str = "ARBITER";

impl MediatorConfig {
    /// Load configuration.
    ///
    /// `path` may point at a TOML, YAML or JSON file (format taken from the extension);
    /// when given it must exist. Environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(MediatorError::Configuration(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: MediatorConfig = settings.try_deserialize()?;

        debug!(
            publish_strategy = ?config.publish_strategy,
            handler_resolution = ?config.handler_resolution,
            log_dispatch = config.log_dispatch,
            source = path.map(|p| p.display().to_string()).unwrap_or_else(|| "environment".to_string()),
            "Mediator configuration loaded"
        );

        Ok(config)
    }

    /// Load from defaults and environment only.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}
