use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
};
use tracing::{debug, trace};

use ptask_core::{ExecutorError, TaskExecutor};
use ptask_model::{Env, Response, TaskId, TaskParams, Timestamp};

use crate::ExecError;

use super::config::SubprocessParams;

/// Default cap for captured output copied into a response message.
const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;
/// Extra bytes kept past the cap so trailing whitespace can be trimmed without losing content.
const TAIL_SLACK: usize = 256;
const READ_CHUNK: usize = 8 * 1024;

/// Executor that runs each firing as one OS subprocess.
///
/// The child is spawned with `kill_on_drop`, so a firing abandoned on timeout or stop takes its process down with it.
/// Every child gets `PTASK_TASK_ID` and `PTASK_HEARTBEAT_MS` on top of the base and task environments.
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    /// Executor name.
    name: &'static str,
    /// Environment applied to every child before the task-level one.
    base_env: Env,
    /// Max bytes of stdout/stderr kept in a response message.
    max_message_len: usize,
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SubprocessExecutor {
    pub fn new() -> Self {
        Self {
            name: "subprocess",
            base_env: Env::new(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }

    /// Set the environment every child inherits; task-level entries override it.
    pub fn with_env(mut self, env: Env) -> Self {
        self.base_env = env;
        self
    }

    pub fn with_max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    fn build_command(&self, task_id: &TaskId, cfg: &SubprocessParams, heartbeat_ms: Timestamp) -> Command {
        let mut cmd = Command::new(&cfg.command);
        cmd.args(&cfg.args);

        if let Some(cwd) = &cfg.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in self.base_env.merged(&cfg.env).iter() {
            cmd.env(key, value);
        }
        cmd.env("PTASK_TASK_ID", task_id.as_str());
        cmd.env("PTASK_HEARTBEAT_MS", heartbeat_ms.to_string());

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Map an exit status (plus captured output) to a response.
    fn to_response(&self, cfg: &SubprocessParams, status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Response {
        let stdout = tail(stdout, self.max_message_len);
        let stderr = tail(stderr, self.max_message_len);
        for line in stderr.lines() {
            debug!(stream = "stderr", "{line}");
        }

        match status.code() {
            Some(0) => {
                if stdout.is_empty() {
                    Response::ok("process exited with code 0")
                } else {
                    Response::ok(stdout)
                }
            }
            Some(code) if cfg.fail_on_non_zero => Response::internal(with_detail(
                format!("process exited with non-zero code: {code}"),
                &stderr,
            )),
            Some(code) => Response::ok(format!("process exited with code {code}")),
            None => Response::internal(with_detail("process terminated by signal".into(), &stderr)),
        }
    }
}

#[async_trait]
impl TaskExecutor for SubprocessExecutor {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run_once(
        &self,
        task_id: &TaskId,
        params: &TaskParams,
        heartbeat_ms: Timestamp,
    ) -> Result<Response, ExecutorError> {
        let cfg = SubprocessParams::from_params(params)?;
        cfg.trace_state(task_id);

        let mut child = self
            .build_command(task_id, &cfg, heartbeat_ms)
            .spawn()
            .map_err(ExecError::Spawn)?;
        trace!(task = %task_id, pid = ?child.id(), "subprocess spawned");

        let keep = self.max_message_len.saturating_add(TAIL_SLACK);
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (status, stdout, stderr) = tokio::try_join!(
            child.wait(),
            read_tail(stdout, keep),
            read_tail(stderr, keep),
        )
        .map_err(ExecError::Io)?;

        let response = self.to_response(&cfg, status, &stdout, &stderr);
        debug!(task = %task_id, code = response.code, status = %status, "subprocess finished");
        Ok(response)
    }

    async fn cleanup(&self, task_id: &TaskId, _params: &TaskParams) -> Result<bool, ExecutorError> {
        // Children never outlive their firing.
        trace!(task = %task_id, "subprocess cleanup: nothing to release");
        Ok(true)
    }
}

/// Drain `reader` to the end, keeping only its last `keep` bytes.
async fn read_tail<R>(reader: Option<R>, keep: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(kept);
        }
        kept.extend_from_slice(&chunk[..n]);
        if kept.len() > keep {
            let excess = kept.len() - keep;
            kept.drain(..excess);
        }
    }
}

/// Last `max` bytes of `bytes` as trimmed text, cut on a char boundary.
fn tail(bytes: &[u8], max: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

fn with_detail(head: String, detail: &str) -> String {
    if detail.is_empty() {
        head
    } else {
        format!("{head}: {detail}")
    }
}
