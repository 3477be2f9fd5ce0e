use thiserror::Error;

use ptask_model::{ModelError, TaskId};

use crate::control::ControlPlaneError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no executor registered for task kind: {0}")]
    NoExecutor(String),

    #[error("executor already registered for task kind: {0}")]
    DuplicateExecutor(String),

    #[error("task {0} is already running")]
    AlreadyRunning(TaskId),

    #[error("worker is shutting down")]
    ShuttingDown,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),
}
