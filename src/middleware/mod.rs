//! Middleware pipeline wrapped around the dispatched handler.

mod core;
mod metrics;
mod tracing;

pub use self::core::Middleware;
pub use self::metrics::MetricsMiddleware;
pub use self::tracing::TracingMiddleware;
