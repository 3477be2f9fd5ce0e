use serde::{Deserialize, Serialize};

use crate::domain::{TaskId, Timestamp};

/// The control plane's statement that this agent should run a task.
///
/// `last_context_updated` moves forward whenever the task configuration changes;
/// the agent restarts a running task only when it sees a strictly newer value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    pub task_id: TaskId,
    pub last_context_updated: Timestamp,
}

impl AssignmentDetails {
    pub fn new(task_id: impl Into<TaskId>, last_context_updated: Timestamp) -> Self {
        Self {
            task_id: task_id.into(),
            last_context_updated,
        }
    }

    /// Returns `true` if `self` carries a strictly newer context than `other`.
    #[inline]
    pub fn is_newer_than(&self, other: &AssignmentDetails) -> bool {
        self.last_context_updated > other.last_context_updated
    }
}
