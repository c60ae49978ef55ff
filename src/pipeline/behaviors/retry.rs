use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{MediatorError, Result};
use crate::messages::Request;
use crate::pipeline::{Next, PipelineBehavior};

/// Reruns the rest of the chain while it fails with a retryable error.
///
/// Attempt `n` (starting at 1) that fails waits `base_delay * 2^(n-1)`, capped at
/// `max_delay`, before the next attempt. Cancellation of the caller's token stops
/// retrying immediately with [`MediatorError::Cancelled`].
///
/// By default every [`MediatorError::Handler`] failure counts as retryable (see
/// [`MediatorError::is_retryable`]), including validation errors a rerun cannot fix.
/// Use [`RetryBehavior::retry_when`] to narrow that:
///
/// ```
/// use std::time::Duration;
/// use arbiter_core::pipeline::behaviors::RetryBehavior;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("invalid input")]
/// struct Invalid;
///
/// let retry = RetryBehavior::new(3, Duration::from_millis(50))
///     .retry_when(|e| e.is_retryable() && e.downcast_ref::<Invalid>().is_none());
/// # let _ = retry;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryBehavior {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    should_retry: fn(&MediatorError) -> bool,
}

impl RetryBehavior {
    /// `max_attempts` counts the first call; values below 1 are treated as 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(30),
            should_retry: MediatorError::is_retryable,
        }
    }

    /// Replace the predicate deciding which failures are retried.
    pub fn retry_when(mut self, should_retry: fn(&MediatorError) -> bool) -> Self {
        self.should_retry = should_retry;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryBehavior {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for RetryBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        token: CancellationToken,
    ) -> Result<R::Response> {
        let request_type = std::any::type_name::<R>();
        let mut attempt = 1;

        loop {
            let error = match next.run(token.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(request_type, attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !(self.should_retry)(&error) || attempt >= self.max_attempts {
                return Err(error);
            }

            let delay = self.delay_for(attempt);
            warn!(
                request_type,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying request"
            );

            tokio::select! {
                _ = token.cancelled() => return Err(MediatorError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}
