//! Prometheus metrics backend for the perpetual task agent.
//!
//! [`PrometheusMetrics`] implements [`ptask_core::MetricsBackend`]; hand it to the worker with
//! `SchedulingWorker::with_metrics`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use ptask_core::MetricsBackend;
//! use ptask_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: Arc<dyn MetricsBackend> = Arc::new(metrics.clone());
//!
//! handle.set_running_tasks(3);
//! assert!(metrics.encode_text()?.contains("ptask_running_tasks 3"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `ptask_tasks_started_total{kind}` - Counter
//! - `ptask_tasks_completed_total{kind, outcome}` - Counter
//! - `ptask_task_duration_seconds{kind}` - Histogram
//! - `ptask_reconcile_total{outcome}` - Counter
//! - `ptask_running_tasks` - Gauge
//!
//! No HTTP exposition is provided; serve [`PrometheusMetrics::encode_text`] from whatever server the host already runs.
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
