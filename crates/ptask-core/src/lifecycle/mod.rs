//! Per-task execution: one bounded-time invocation of an executor per firing.
mod counter;
pub use counter::{ExecutionCounter, ExecutionGuard};

use std::{any::Any, sync::Arc, time::Instant};

use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;
use tracing::{Instrument, debug, instrument, trace, warn};

use ptask_model::{AccountId, ExecutionContext, Response, TaskId};

use crate::{
    control::ControlPlaneClient,
    executor::TaskExecutor,
    metrics::{MetricsHandle, TaskOutcome},
};

/// Owns the fixed bindings of one running task and performs its firings.
///
/// Stateless between firings: every [`run_once`](Self::run_once) is independent, with no attempt
/// count or per-task backoff kept here.
pub struct TaskLifecycleManager {
    context: Arc<ExecutionContext>,
    executor: Arc<dyn TaskExecutor>,
    client: Arc<dyn ControlPlaneClient>,
    account_id: AccountId,
    counter: ExecutionCounter,
    metrics: MetricsHandle,
}

impl TaskLifecycleManager {
    pub fn new(
        context: ExecutionContext,
        executor: Arc<dyn TaskExecutor>,
        client: Arc<dyn ControlPlaneClient>,
        account_id: AccountId,
        counter: ExecutionCounter,
        metrics: MetricsHandle,
    ) -> Self {
        Self {
            context: Arc::new(context),
            executor,
            client,
            account_id,
            counter,
            metrics,
        }
    }

    #[inline]
    pub fn task_id(&self) -> &TaskId {
        &self.context.task_id
    }

    #[inline]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Run the executor once under the task timeout and report a non-200 result upstream.
    ///
    /// The in-flight counter is held for the executor call only and released on every path.
    /// The executor runs on its own runtime task: on timeout it is aborted at its next await
    /// point, and the timeout response does not wait for that to happen.
    #[instrument(level = "debug", skip(self), fields(task = %self.context.task_id, kind = %self.context.kind()))]
    pub async fn run_once(&self) -> Response {
        let kind = self.context.kind();
        let started = Instant::now();

        let guard = self.counter.enter();
        self.metrics.record_task_started(kind);
        let (response, outcome) = self.invoke().await;
        drop(guard);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics.record_task_completed(kind, outcome, elapsed_ms);
        debug!(code = response.code, elapsed_ms, "firing finished");

        if !response.is_success() {
            self.report_failure(response.clone());
        }
        response
    }

    /// Best-effort executor cleanup. Never fails; problems are logged.
    ///
    /// Cleanup gets the task timeout as its budget. A cleanup that outlives it is aborted and
    /// counted as failed, so a stuck executor cannot hold up the caller.
    pub async fn stop(&self) -> bool {
        let executor = Arc::clone(&self.executor);
        let ctx = Arc::clone(&self.context);
        let limit = self.context.schedule.timeout();
        let handle = AbortOnDropHandle::new(tokio::spawn(async move {
            executor.cleanup(&ctx.task_id, &ctx.params).await
        }));

        match tokio::time::timeout(limit, handle).await {
            Ok(Ok(Ok(done))) => {
                debug!(task = %self.context.task_id, done, "executor cleanup finished");
                done
            }
            Ok(Ok(Err(e))) => {
                warn!(task = %self.context.task_id, error = %e, "executor cleanup failed");
                false
            }
            Ok(Err(e)) => {
                warn!(task = %self.context.task_id, error = %join_reason(e), "executor cleanup aborted");
                false
            }
            Err(_) => {
                warn!(
                    task = %self.context.task_id,
                    timeout_ms = self.context.schedule.timeout_ms,
                    "executor cleanup timed out; abandoning it"
                );
                false
            }
        }
    }

    async fn invoke(&self) -> (Response, TaskOutcome) {
        let executor = Arc::clone(&self.executor);
        let ctx = Arc::clone(&self.context);
        let timeout = self.context.schedule.timeout();

        let handle = AbortOnDropHandle::new(tokio::spawn(async move {
            executor
                .run_once(&ctx.task_id, &ctx.params, ctx.heartbeat_ms)
                .await
        }));

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(Ok(response))) => {
                let outcome = TaskOutcome::from_response(&response);
                (response, outcome)
            }
            Ok(Ok(Err(e))) => (Response::internal(e.to_string()), TaskOutcome::Error),
            Ok(Err(e)) => (
                Response::internal(format!("executor aborted: {}", join_reason(e))),
                TaskOutcome::Error,
            ),
            Err(_) => (
                Response::timeout(format!(
                    "task {} timed out after {} ms",
                    self.context.task_id, self.context.schedule.timeout_ms
                )),
                TaskOutcome::Timeout,
            ),
        }
    }

    /// Hand a failed result to the control plane without holding up the firing.
    ///
    /// The report runs detached, bounded by the task timeout. A lost report is only logged.
    fn report_failure(&self, response: Response) {
        warn!(code = response.code, reason = %response.message, "firing failed; reporting");

        let client = Arc::clone(&self.client);
        let task_id = self.context.task_id.clone();
        let account_id = self.account_id.clone();
        let limit = self.context.schedule.timeout();
        tokio::spawn(
            async move {
                match tokio::time::timeout(limit, client.report_failure(&task_id, &account_id, &response)).await {
                    Ok(Ok(())) => trace!("failure report delivered"),
                    Ok(Err(e)) => warn!(error = %e, "failure report was not delivered"),
                    Err(_) => warn!(timeout_ms = limit.as_millis() as u64, "failure report timed out"),
                }
            }
            .in_current_span(),
        );
    }
}

fn join_reason(e: JoinError) -> String {
    if e.is_panic() {
        format!("panicked: {}", panic_message(e.into_panic()))
    } else {
        "cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
