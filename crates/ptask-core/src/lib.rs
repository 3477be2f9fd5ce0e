mod error;
pub use error::CoreError;

mod backoff;
pub use backoff::ReconcileBackoff;

pub mod control;
pub use control::{ControlPlaneClient, ControlPlaneError};

pub mod executor;
pub use executor::{ExecutorError, TaskExecutor};

pub mod lifecycle;
pub use lifecycle::{ExecutionCounter, ExecutionGuard, TaskLifecycleManager};

mod metrics;
pub use metrics::{
    MetricsBackend, MetricsHandle, NoOpMetrics, ReconcileOutcome, TaskOutcome, noop_metrics,
};

mod registry;
pub use registry::ExecutorRegistry;

pub mod worker;
pub use worker::{ReconcilePlan, ReconcileReport, SchedulingWorker, WorkerConfig};

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::control::{ControlPlaneClient, ControlPlaneError};
    pub use crate::error::CoreError;
    pub use crate::executor::{ExecutorError, TaskExecutor};
    pub use crate::registry::ExecutorRegistry;
    pub use crate::worker::{SchedulingWorker, WorkerConfig};
}
