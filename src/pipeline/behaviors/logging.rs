use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Level};
use uuid::Uuid;

use crate::error::Result;
use crate::messages::Request;
use crate::pipeline::{Next, PipelineBehavior};

/// Logs entry and exit of every request with a per-call correlation id and the
/// elapsed time.
#[derive(Debug, Clone)]
pub struct LoggingBehavior {
    level: Level,
}

impl LoggingBehavior {
    pub fn new() -> Self {
        Self { level: Level::INFO }
    }

    /// Emit the start/finish events at `level`. Failures are always logged at ERROR.
    pub fn with_level(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingBehavior {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for LoggingBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        token: CancellationToken,
    ) -> Result<R::Response> {
        let correlation_id = Uuid::new_v4();
        let request_type = std::any::type_name::<R>();
        let started = Instant::now();

        if self.level <= Level::INFO {
            info!(%correlation_id, request_type, "Handling request");
        } else {
            debug!(%correlation_id, request_type, "Handling request");
        }

        let result = next.run(token).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) if self.level <= Level::INFO => {
                info!(%correlation_id, request_type, elapsed_ms, "Request handled");
            }
            Ok(_) => {
                debug!(%correlation_id, request_type, elapsed_ms, "Request handled");
            }
            Err(e) => {
                error!(%correlation_id, request_type, elapsed_ms, error = %e, "Request failed");
            }
        }

        result
    }
}
