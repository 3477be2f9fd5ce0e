use serde::{Deserialize, Serialize};

use crate::{
    domain::{TaskId, Timestamp},
    task::{TaskParams, TaskSchedule},
};

/// Everything needed to run one task, fetched when the task starts or is updated.
///
/// Immutable for the lifetime of one schedule; an update replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub task_id: TaskId,
    pub params: TaskParams,
    pub schedule: TaskSchedule,
    pub heartbeat_ms: Timestamp,
}

impl ExecutionContext {
    /// Executor discriminator carried in the params.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.params.kind
    }
}
