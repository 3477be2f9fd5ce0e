use thiserror::Error;

use ptask_core::ExecutorError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unsupported task kind: expected {expected}, got {actual}")]
    UnsupportedKind {
        expected: &'static str,
        actual: String,
    },

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExecError> for ExecutorError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::UnsupportedKind { expected, actual } => ExecutorError::Unsupported {
                executor: expected,
                kind: actual,
            },
            ExecError::InvalidParams(reason) => ExecutorError::InvalidParams(reason),
            ExecError::Spawn(e) => ExecutorError::Io(format!("spawn failed: {e}")),
            ExecError::Io(e) => ExecutorError::Io(e.to_string()),
        }
    }
}
