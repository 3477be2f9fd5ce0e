//! Subprocess executor for the `"subprocess"` task kind.
//!
//! Each firing spawns one child via `tokio::process::Command` and maps its exit status to a [`ptask_model::Response`].
mod config;
mod executor;

pub use config::SubprocessParams;
pub use executor::SubprocessExecutor;

use std::sync::Arc;

use ptask_core::{CoreError, ExecutorRegistry};

/// Task kind handled by [`SubprocessExecutor`].
pub const SUBPROCESS_KIND: &str = "subprocess";

/// Register the built-in subprocess executor in the given registry.
///
/// After this call, any task whose params carry `kind = "subprocess"` is handled by [`SubprocessExecutor`].
pub fn register_subprocess_executor(registry: &mut ExecutorRegistry) -> Result<(), CoreError> {
    registry.register(SUBPROCESS_KIND, Arc::new(SubprocessExecutor::new()))
}
