use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use ptask_core::{ControlPlaneClient, ControlPlaneError};
use ptask_model::{
    AccountId, AssignmentDetails, ExecutionContext, Response, TaskId, TaskParams, TaskSchedule,
    Timestamp, WorkerId,
};

#[derive(Debug, Deserialize)]
struct AssignmentsFile {
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskEntry {
    id: TaskId,
    #[serde(default)]
    last_context_updated: Timestamp,
    params: TaskParams,
    schedule: TaskSchedule,
}

/// Control plane backed by a local JSON file.
///
/// The file is re-read on every assignment poll; execution contexts are served from the last successful read.
/// A missing file behaves like an unreachable control plane, so running tasks are kept.
/// Failure reports only go to the log.
#[derive(Debug)]
pub struct FileControlPlane {
    path: PathBuf,
    contexts: Mutex<HashMap<TaskId, ExecutionContext>>,
}

impl FileControlPlane {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            contexts: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<AssignmentsFile, ControlPlaneError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ControlPlaneError::Unavailable(format!(
                    "{} does not exist",
                    self.path.display()
                )),
                _ => ControlPlaneError::Internal(format!("read {}: {e}", self.path.display())),
            })?;
        serde_json::from_str(&raw)
            .map_err(|e| ControlPlaneError::Rejected(format!("parse {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl ControlPlaneClient for FileControlPlane {
    async fn list_assignments(
        &self,
        worker_id: &WorkerId,
    ) -> Result<Vec<AssignmentDetails>, ControlPlaneError> {
        let file = self.read().await?;
        let heartbeat_ms = now_ms();

        let mut contexts = HashMap::with_capacity(file.tasks.len());
        let mut assignments = Vec::with_capacity(file.tasks.len());
        for entry in file.tasks {
            assignments.push(AssignmentDetails::new(
                entry.id.clone(),
                entry.last_context_updated,
            ));
            contexts.insert(
                entry.id.clone(),
                ExecutionContext {
                    task_id: entry.id,
                    params: entry.params,
                    schedule: entry.schedule,
                    heartbeat_ms,
                },
            );
        }
        debug!(worker = %worker_id, count = assignments.len(), path = %self.path.display(), "assignments read");

        *self.contexts.lock().unwrap_or_else(PoisonError::into_inner) = contexts;
        Ok(assignments)
    }

    async fn execution_context(
        &self,
        task_id: &TaskId,
    ) -> Result<ExecutionContext, ControlPlaneError> {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_id)
            .cloned()
            .ok_or_else(|| ControlPlaneError::NotFound(task_id.clone()))
    }

    async fn report_failure(
        &self,
        task_id: &TaskId,
        account_id: &AccountId,
        response: &Response,
    ) -> Result<(), ControlPlaneError> {
        warn!(
            task = %task_id,
            account = %account_id,
            code = response.code,
            reason = %response.message,
            "task execution failed"
        );
        Ok(())
    }
}

fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or_default()
}
