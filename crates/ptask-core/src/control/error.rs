use thiserror::Error;

use ptask_model::TaskId;

#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("control plane unavailable: {0}")]
    Unavailable(String),

    #[error("control plane deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("no execution context for task {0}")]
    NotFound(TaskId),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("control plane error: {0}")]
    Internal(String),
}

impl ControlPlaneError {
    /// Transient outages that the reconcile loop absorbs without escalating its backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ControlPlaneError::Unavailable(_) | ControlPlaneError::DeadlineExceeded(_)
        )
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlPlaneError::Unavailable(_) => "unavailable",
            ControlPlaneError::DeadlineExceeded(_) => "deadline_exceeded",
            ControlPlaneError::NotFound(_) => "not_found",
            ControlPlaneError::Rejected(_) => "rejected",
            ControlPlaneError::Internal(_) => "internal",
        }
    }
}
