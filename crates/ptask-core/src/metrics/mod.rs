//! Metrics collection abstraction for the scheduler.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are handed to the worker at construction.
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, ReconcileOutcome, TaskOutcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
