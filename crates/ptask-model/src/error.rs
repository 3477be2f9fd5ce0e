use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown jitter strategy: {0}")]
    UnknownJitter(String),

    #[error("invalid backoff: {0}")]
    InvalidBackoff(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("cannot decode params for kind '{kind}': {reason}")]
    Params { kind: String, reason: String },
}

pub type ModelResult<T> = Result<T, ModelError>;
