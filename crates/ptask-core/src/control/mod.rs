//! Control plane seam: where assignments come from and where failures go.
mod error;
pub use error::ControlPlaneError;

use async_trait::async_trait;

use ptask_model::{AccountId, AssignmentDetails, ExecutionContext, Response, TaskId, WorkerId};

/// Client for the central control plane.
///
/// The transport behind it is opaque to the scheduler; implementations map their
/// transport failures onto [`ControlPlaneError`] so the worker can tell retryable
/// outages from real errors.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    /// Current set of tasks this worker should be running.
    async fn list_assignments(
        &self,
        worker_id: &WorkerId,
    ) -> Result<Vec<AssignmentDetails>, ControlPlaneError>;

    /// Params and schedule for one task.
    async fn execution_context(&self, task_id: &TaskId)
    -> Result<ExecutionContext, ControlPlaneError>;

    /// Tell the control plane a firing did not succeed.
    async fn report_failure(
        &self,
        task_id: &TaskId,
        account_id: &AccountId,
        response: &Response,
    ) -> Result<(), ControlPlaneError>;
}
