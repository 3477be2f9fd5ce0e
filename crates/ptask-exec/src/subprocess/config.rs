use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::trace;

use ptask_model::{Env, TaskId, TaskParams};

use crate::ExecError;

use super::SUBPROCESS_KIND;

fn default_fail_on_non_zero() -> bool {
    true
}

/// Payload of a `"subprocess"` task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubprocessParams {
    /// Command to execute (e.g. `"ls"`, `"/usr/bin/python"`).
    pub command: String,
    /// Command-line arguments passed to the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Task-level environment; overrides the executor's base environment.
    #[serde(default)]
    pub env: Env,
    /// Working directory for the subprocess.
    ///
    /// If `None`, the subprocess inherits the agent's working directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Whether non-zero exit codes should be reported as failures.
    #[serde(default = "default_fail_on_non_zero")]
    pub fail_on_non_zero: bool,
}

impl SubprocessParams {
    /// Decode and validate the payload of `params`.
    pub fn from_params(params: &TaskParams) -> Result<Self, ExecError> {
        if params.kind != SUBPROCESS_KIND {
            return Err(ExecError::UnsupportedKind {
                expected: SUBPROCESS_KIND,
                actual: params.kind.clone(),
            });
        }
        let parsed: SubprocessParams = params
            .decode()
            .map_err(|e| ExecError::InvalidParams(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Rules:
    /// - `command` is not empty or whitespace-only.
    pub fn validate(&self) -> Result<(), ExecError> {
        if self.command.trim().is_empty() {
            return Err(ExecError::InvalidParams("subprocess command is empty".into()));
        }
        Ok(())
    }

    /// Emit a trace-level log with the essential fields.
    pub fn trace_state(&self, task_id: &TaskId) {
        trace!(
            task = %task_id,
            command = %self.command,
            args = ?self.args,
            cwd = ?self.cwd,
            env_len = self.env.len(),
            fail_on_non_zero = self.fail_on_non_zero,
            "subprocess params resolved"
        );
    }
}

impl fmt::Display for SubprocessParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Subprocess(cmd='{}', args={}, env={}, cwd={:?}, fail_on_non_zero={})",
            self.command,
            self.args.len(),
            self.env.len(),
            self.cwd,
            self.fail_on_non_zero,
        )
    }
}
