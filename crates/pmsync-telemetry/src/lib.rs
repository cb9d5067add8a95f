//! Prometheus metrics and structured logging for pmsync.
//!
//! - Structured logging with tracing (pretty in development, JSON in production)
//! - Prometheus counters and gauges for channel health, eviction and refresh

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
