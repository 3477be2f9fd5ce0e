use std::{sync::Arc, time::Duration};

use tokio::{sync::Semaphore, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use ptask_model::AssignmentDetails;

use crate::lifecycle::TaskLifecycleManager;

/// Cancellable fixed-delay schedule of one task.
pub(crate) struct TaskHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Start firing `manager` immediately, then `interval` after each firing completes.
    ///
    /// Every firing first takes a permit from the shared `pool`.
    pub(crate) fn spawn(
        manager: Arc<TaskLifecycleManager>,
        interval: Duration,
        pool: Arc<Semaphore>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            loop {
                let permit = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    permit = Arc::clone(&pool).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = manager.run_once() => {}
                }
                drop(permit);

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            trace!(task = %manager.task_id(), "schedule loop exited");
        });
        Self { cancel, join }
    }

    /// Stop the schedule, interrupting a firing that is in progress.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Entry of the worker's running-task map.
pub(crate) struct RunningTask {
    pub(crate) handle: TaskHandle,
    pub(crate) manager: Arc<TaskLifecycleManager>,
    pub(crate) assignment: AssignmentDetails,
}
