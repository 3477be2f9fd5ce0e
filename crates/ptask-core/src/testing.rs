//! In-memory fakes for the control plane and executors.
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::json;

use ptask_model::{
    AccountId, AssignmentDetails, ExecutionContext, Response, TaskId, TaskParams, TaskSchedule,
    Timestamp, WorkerId,
};

use crate::{
    control::{ControlPlaneClient, ControlPlaneError},
    executor::{ExecutorError, TaskExecutor},
};

pub const FAKE_KIND: &str = "fake";

/// Build an execution context for the fake executor kind.
pub fn mk_context(id: &str, interval_ms: u64, timeout_ms: u64) -> ExecutionContext {
    ExecutionContext {
        task_id: TaskId::from(id),
        params: TaskParams::new(FAKE_KIND, json!({ "id": id })),
        schedule: TaskSchedule {
            interval_ms,
            timeout_ms,
        },
        heartbeat_ms: 1_700_000_000_000,
    }
}

pub fn mk_assignment(id: &str, updated: Timestamp) -> AssignmentDetails {
    AssignmentDetails::new(id, updated)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Collaboration {
    #[default]
    Ok,
    Fail,
    /// Never returns.
    Hang,
}

#[derive(Debug, Clone)]
enum Behavior {
    Respond(Response),
    Fail(String),
    Panic(String),
    Sleep(Duration),
}

/// Scriptable executor that records what was asked of it.
#[derive(Debug)]
pub struct FakeExecutor {
    behavior: Behavior,
    cleanup: Collaboration,
    runs: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    cleanups: Mutex<Vec<TaskId>>,
}

impl FakeExecutor {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            cleanup: Collaboration::Ok,
            runs: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            cleanups: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with(Behavior::Respond(Response::ok("done")))
    }

    pub fn responding(response: Response) -> Self {
        Self::with(Behavior::Respond(response))
    }

    pub fn failing(msg: &str) -> Self {
        Self::with(Behavior::Fail(msg.to_string()))
    }

    pub fn panicking(msg: &str) -> Self {
        Self::with(Behavior::Panic(msg.to_string()))
    }

    pub fn sleeping(d: Duration) -> Self {
        Self::with(Behavior::Sleep(d))
    }

    pub fn with_failing_cleanup(mut self) -> Self {
        self.cleanup = Collaboration::Fail;
        self
    }

    pub fn with_hanging_cleanup(mut self) -> Self {
        self.cleanup = Collaboration::Hang;
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `run_once` calls observed.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn cleanups(&self) -> Vec<TaskId> {
        self.cleanups.lock().unwrap().clone()
    }

    pub fn cleanups_for(&self, id: &str) -> usize {
        self.cleanups().iter().filter(|t| t.as_str() == id).count()
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskExecutor for FakeExecutor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn run_once(
        &self,
        _task_id: &TaskId,
        _params: &TaskParams,
        _heartbeat_ms: Timestamp,
    ) -> Result<Response, ExecutorError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let _active = ActiveGuard(&self.active);

        match &self.behavior {
            Behavior::Respond(r) => Ok(r.clone()),
            Behavior::Fail(msg) => Err(ExecutorError::Internal(msg.clone())),
            Behavior::Panic(msg) => panic!("{}", msg),
            Behavior::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(Response::ok("slept"))
            }
        }
    }

    async fn cleanup(&self, task_id: &TaskId, _params: &TaskParams) -> Result<bool, ExecutorError> {
        self.cleanups.lock().unwrap().push(task_id.clone());
        match self.cleanup {
            Collaboration::Ok => Ok(true),
            Collaboration::Fail => Err(ExecutorError::Internal("cleanup exploded".into())),
            Collaboration::Hang => std::future::pending().await,
        }
    }
}

/// Control plane double with a mutable assignment list.
#[derive(Default)]
pub struct FakeControlPlane {
    assignments: Mutex<Vec<AssignmentDetails>>,
    list_failure: Mutex<Option<fn() -> ControlPlaneError>>,
    contexts: Mutex<HashMap<TaskId, ExecutionContext>>,
    reports: Mutex<Vec<(TaskId, AccountId, Response)>>,
    reports_mode: Collaboration,
    list_calls: AtomicUsize,
    context_fetches: AtomicUsize,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_reports(mut self) -> Self {
        self.reports_mode = Collaboration::Fail;
        self
    }

    pub fn with_hanging_reports(mut self) -> Self {
        self.reports_mode = Collaboration::Hang;
        self
    }

    pub fn set_assignments(&self, list: Vec<AssignmentDetails>) {
        *self.assignments.lock().unwrap() = list;
    }

    pub fn fail_list_with(&self, f: fn() -> ControlPlaneError) {
        *self.list_failure.lock().unwrap() = Some(f);
    }

    pub fn clear_list_failure(&self) {
        *self.list_failure.lock().unwrap() = None;
    }

    pub fn put_context(&self, ctx: ExecutionContext) {
        self.contexts
            .lock()
            .unwrap()
            .insert(ctx.task_id.clone(), ctx);
    }

    pub fn reports(&self) -> Vec<(TaskId, AccountId, Response)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn context_fetches(&self) -> usize {
        self.context_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlaneClient for FakeControlPlane {
    async fn list_assignments(
        &self,
        _worker_id: &WorkerId,
    ) -> Result<Vec<AssignmentDetails>, ControlPlaneError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = *self.list_failure.lock().unwrap() {
            return Err(f());
        }
        Ok(self.assignments.lock().unwrap().clone())
    }

    async fn execution_context(
        &self,
        task_id: &TaskId,
    ) -> Result<ExecutionContext, ControlPlaneError> {
        self.context_fetches.fetch_add(1, Ordering::SeqCst);
        self.contexts
            .lock()
            .unwrap()
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
        self.reports
            .lock()
            .unwrap()
            .push((task_id.clone(), account_id.clone(), response.clone()));
        match self.reports_mode {
            Collaboration::Ok => Ok(()),
            Collaboration::Fail => Err(ControlPlaneError::Internal("report sink down".into())),
            Collaboration::Hang => std::future::pending().await,
        }
    }
}
