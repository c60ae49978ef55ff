//! Notification fan-out strategies.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{MediatorError, Result};
use crate::handlers::NotificationHandler;
use crate::messages::Notification;

type Handlers<N> = Vec<Arc<dyn NotificationHandler<N>>>;

/// Start every handler and drive all of them to completion, then return the first
/// failure in start order.
pub(super) async fn concurrent<N: Notification>(
    handlers: &Handlers<N>,
    notification: &N,
    token: CancellationToken,
) -> Result<()> {
    let outcomes = join_all(
        handlers
            .iter()
            .map(|handler| handler.handle(notification, token.clone())),
    )
    .await;

    let mut first_failure = None;
    for (handler, outcome) in handlers.iter().zip(outcomes) {
        if let Err(e) = outcome {
            debug!(handler = handler.handler_name(), error = %e, "Notification handler failed");
            first_failure.get_or_insert(e);
        }
    }
    first_failure.map_or(Ok(()), Err)
}

/// One tokio task per handler, joined in registration order.
pub(super) async fn spawned<N: Notification>(
    handlers: Handlers<N>,
    notification: N,
    token: CancellationToken,
) -> Result<()> {
    let notification = Arc::new(notification);

    let tasks: Vec<_> = handlers
        .into_iter()
        .map(|handler| {
            let notification = Arc::clone(&notification);
            let token = token.clone();
            let handler_name = handler.handler_name().to_string();
            let task = tokio::spawn(async move { handler.handle(&notification, token).await });
            (handler_name, task)
        })
        .collect();

    for (handler_name, task) in tasks {
        match task.await {
            Ok(outcome) => outcome?,
            Err(join_error) => {
                return Err(panicked::<N>(&handler_name, join_error));
            }
        }
    }
    Ok(())
}

/// Await handlers one at a time.
pub(super) async fn sequential<N: Notification>(
    handlers: &Handlers<N>,
    notification: &N,
    token: CancellationToken,
) -> Result<()> {
    for handler in handlers {
        if let Err(e) = handler.handle(notification, token.clone()).await {
            debug!(handler = handler.handler_name(), error = %e, "Notification handler failed");
            return Err(e);
        }
    }
    Ok(())
}

fn panicked<N: Notification>(handler_name: &str, join_error: JoinError) -> MediatorError {
    let reason = if join_error.is_panic() {
        let payload = join_error.into_panic();
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string())
    } else {
        "task was cancelled".to_string()
    };

    error!(
        handler = handler_name,
        notification_type = std::any::type_name::<N>(),
        reason = %reason,
        "Notification handler task failed"
    );

    MediatorError::HandlerPanicked {
        notification_type: std::any::type_name::<N>(),
        reason,
    }
}
