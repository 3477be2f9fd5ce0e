mod domain;
pub use domain::{AccountId, Env, TaskId, TimeoutMs, Timestamp, WorkerId};

mod error;
pub use error::{ModelError, ModelResult};

mod strategy;
pub use strategy::{BackoffStrategy, JitterStrategy};

mod task;
pub use task::{
    AssignmentDetails, CODE_INTERNAL, CODE_OK, CODE_TIMEOUT, ExecutionContext, Response,
    TaskParams, TaskSchedule,
};
