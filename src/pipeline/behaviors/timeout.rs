use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{MediatorError, Result};
use crate::messages::Request;
use crate::pipeline::{Next, PipelineBehavior};

/// Fails the request with [`MediatorError::Timeout`] when the rest of the chain does not
/// finish within the configured duration.
///
/// Inner links receive a child of the caller's token, which is cancelled on timeout so
/// cooperative handlers can stop their work.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBehavior {
    timeout: Duration,
}

impl TimeoutBehavior {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for TimeoutBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        token: CancellationToken,
    ) -> Result<R::Response> {
        let inner_token = token.child_token();

        match tokio::time::timeout(self.timeout, next.run(inner_token.clone())).await {
            Ok(result) => result,
            Err(_) => {
                inner_token.cancel();
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(
                    request_type = std::any::type_name::<R>(),
                    timeout_ms, "Request timed out"
                );
                Err(MediatorError::Timeout {
                    request_type: std::any::type_name::<R>(),
                    timeout_ms,
                })
            }
        }
    }
}
