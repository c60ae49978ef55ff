//! Reusable pipeline behaviors.
//!
//! Each behavior is generic over the request type, so one value can be registered for
//! any number of request types:
//!
//! ```rust
//! use arbiter_core::container::ServiceCollection;
//! use arbiter_core::pipeline::behaviors::{LoggingBehavior, TimeoutBehavior};
//! use arbiter_core::Request;
//! use std::time::Duration;
//!
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = ();
//! }
//!
//! let mut services = ServiceCollection::new();
//! services
//!     .add_pipeline_behavior::<Ping, _>(LoggingBehavior::new())
//!     .add_pipeline_behavior::<Ping, _>(TimeoutBehavior::new(Duration::from_secs(5)));
//! ```

mod logging;
mod retry;
mod timeout;

pub use logging::LoggingBehavior;
pub use retry::RetryBehavior;
pub use timeout::TimeoutBehavior;
