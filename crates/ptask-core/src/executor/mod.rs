//! Executor abstraction: the per-kind code that performs one firing of a perpetual task.
//!
//! Concrete executors implement [`TaskExecutor`] and are plugged into the [`crate::ExecutorRegistry`].
mod error;
pub use error::ExecutorError;

use async_trait::async_trait;

use ptask_model::{Response, TaskId, TaskParams, Timestamp};

/// One kind of perpetual task work (e.g. "sync pods of this release").
///
/// Contract:
/// - `run_once` is called repeatedly on a fixed delay; a given task id never has two concurrent
///   calls, but different tasks of the same kind run in parallel on the same instance.
/// - a call may be abandoned at any await point when it exceeds its timeout or the task is stopped;
///   the scheduler does not wait for the executor to notice.
/// - `cleanup` is called at most once per stop and is best-effort.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Executor name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Perform one firing and describe the result.
    ///
    /// Returning `Err` is treated the same as an unexpected failure and reported with code 500.
    async fn run_once(
        &self,
        task_id: &TaskId,
        params: &TaskParams,
        heartbeat_ms: Timestamp,
    ) -> Result<Response, ExecutorError>;

    /// Release whatever the task held. Returns `true` if cleanup succeeded.
    async fn cleanup(&self, task_id: &TaskId, params: &TaskParams) -> Result<bool, ExecutorError>;
}
