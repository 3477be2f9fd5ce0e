use thiserror::Error;

use ptask_model::ModelError;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("invalid task params: {0}")]
    InvalidParams(String),

    #[error("unsupported task kind for executor '{executor}': {kind}")]
    Unsupported { executor: &'static str, kind: String },

    #[error("io error: {0}")]
    Io(String),

    #[error("{0}")]
    Internal(String),
}

impl From<std::io::Error> for ExecutorError {
    fn from(e: std::io::Error) -> Self {
        ExecutorError::Io(e.to_string())
    }
}

impl From<ModelError> for ExecutorError {
    fn from(e: ModelError) -> Self {
        ExecutorError::InvalidParams(e.to_string())
    }
}
