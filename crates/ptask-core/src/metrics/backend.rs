use std::sync::Arc;

use ptask_model::{CODE_OK, CODE_TIMEOUT, Response};

/// Outcome of a single task firing, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Executor answered with 200.
    Success,
    /// Executor answered with a non-200 code.
    Failure,
    /// Firing exceeded its timeout.
    Timeout,
    /// Executor returned an error or panicked.
    Error,
}

impl TaskOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskOutcome::Success => "success",
            TaskOutcome::Failure => "failure",
            TaskOutcome::Timeout => "timeout",
            TaskOutcome::Error => "error",
        }
    }

    /// Classify an executor-provided response.
    pub fn from_response(response: &Response) -> Self {
        match response.code {
            CODE_OK => TaskOutcome::Success,
            CODE_TIMEOUT => TaskOutcome::Timeout,
            _ => TaskOutcome::Failure,
        }
    }
}

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Success,
    /// Control plane unavailable or slow; backoff not escalated.
    Retryable,
    Failure,
}

impl ReconcileOutcome {
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Success => "success",
            ReconcileOutcome::Retryable => "retryable",
            ReconcileOutcome::Failure => "failure",
        }
    }
}

/// Backend metrics collection interface.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Called right before an executor is invoked.
    ///
    /// # Arguments
    /// - `kind`: task kind (executor discriminator)
    fn record_task_started(&self, kind: &str);
    /// Called once per firing with its outcome and wall-clock duration.
    fn record_task_completed(&self, kind: &str, outcome: TaskOutcome, duration_ms: u64);
    /// Called after every reconcile pass.
    fn record_reconcile(&self, outcome: ReconcileOutcome);
    /// Number of tasks currently scheduled on this worker.
    fn set_running_tasks(&self, count: usize);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
