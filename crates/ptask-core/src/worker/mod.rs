//! Scheduling worker: keeps the locally running task set in line with the control plane.
//! - Polls assignments on a backoff-governed cadence.
//! - Diffs them against the running-task map and stops, starts or restarts tasks.
//! - Owns the running-task map and the in-flight execution counter.
mod config;
pub use config::WorkerConfig;

mod handle;
use handle::{RunningTask, TaskHandle};

mod plan;
pub use plan::{ReconcilePlan, ReconcileReport};

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::{Notify, Semaphore},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use ptask_model::{AssignmentDetails, TaskId};

use crate::{
    backoff::ReconcileBackoff,
    control::{ControlPlaneClient, ControlPlaneError},
    error::CoreError,
    lifecycle::{ExecutionCounter, TaskLifecycleManager},
    metrics::{MetricsHandle, ReconcileOutcome, noop_metrics},
    registry::ExecutorRegistry,
};

/// Top-level control loop of the agent.
///
/// All collaborators are injected; there is no process-wide state.
/// The running-task map is guarded by a single mutex that is held only for inserts and removals,
/// never across a control plane call or an executor invocation.
pub struct SchedulingWorker {
    config: WorkerConfig,
    client: Arc<dyn ControlPlaneClient>,
    registry: Arc<ExecutorRegistry>,
    metrics: MetricsHandle,
    running: Mutex<HashMap<TaskId, RunningTask>>,
    counter: ExecutionCounter,
    pool: Arc<Semaphore>,
    shutdown: CancellationToken,
    refresh: Notify,
}

impl SchedulingWorker {
    /// Create a worker. Nothing runs until [`run`](Self::run) or [`spawn`](Self::spawn) is called.
    pub fn new(
        config: WorkerConfig,
        client: Arc<dyn ControlPlaneClient>,
        registry: Arc<ExecutorRegistry>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let pool = Arc::new(Semaphore::new(config.max_concurrent_executions));
        Ok(Self {
            config,
            client,
            registry,
            metrics: noop_metrics(),
            running: Mutex::new(HashMap::new()),
            counter: ExecutionCounter::new(),
            pool,
            shutdown: CancellationToken::new(),
            refresh: Notify::new(),
        })
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Configuration the worker was built with (already validated).
    #[inline]
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Executor invocations currently in flight.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.counter.current()
    }

    /// Ids of all scheduled tasks, sorted.
    pub fn running_tasks(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.tasks().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether `task_id` is currently scheduled.
    ///
    /// A task counts as running from the moment its schedule is installed until `stop_task` removes it,
    /// whether or not a firing is in progress right now.
    pub fn is_running(&self, task_id: &TaskId) -> bool {
        self.tasks().contains_key(task_id)
    }

    /// Assignment a running task was last (re)started with.
    pub fn assignment_of(&self, task_id: &TaskId) -> Option<AssignmentDetails> {
        self.tasks().get(task_id).map(|t| t.assignment.clone())
    }

    /// Wake the reconcile loop now instead of waiting for the current delay.
    ///
    /// Used when the control plane pushes an "assignments changed" hint.
    pub fn request_refresh(&self) {
        debug!("assignment refresh requested");
        self.refresh.notify_one();
    }

    /// Start the reconcile loop on the current runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let worker = Arc::clone(self);
        tokio::spawn(async move { worker.run().await })
    }

    /// Reconcile loop. Returns once [`shutdown`](Self::shutdown) has been requested.
    ///
    /// Passes never overlap: the next one is scheduled after the previous one finished.
    pub async fn run(&self) {
        info!(worker = %self.config.worker_id, "scheduling worker started");
        let mut backoff = ReconcileBackoff::new(self.config.backoff.clone());

        while !self.shutdown.is_cancelled() {
            let delay = self.reconcile_cycle(&mut backoff).await;
            debug!(delay_ms = delay.as_millis() as u64, "next reconcile scheduled");

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.refresh.notified() => trace!("reconcile woken by refresh"),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!(worker = %self.config.worker_id, "scheduling worker loop stopped");
    }

    /// One reconcile pass plus the backoff bookkeeping; returns the delay before the next pass.
    pub(crate) async fn reconcile_cycle(&self, backoff: &mut ReconcileBackoff) -> Duration {
        match self.reconcile().await {
            Ok(report) => {
                if report.is_noop() {
                    trace!("reconcile pass: nothing to do");
                } else {
                    info!(%report, "reconcile pass finished");
                }
                self.metrics.record_reconcile(ReconcileOutcome::Success);
                backoff.on_success()
            }
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "control plane not reachable; keeping current tasks");
                self.metrics.record_reconcile(ReconcileOutcome::Retryable);
                backoff.on_retryable()
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "reconcile pass failed");
                self.metrics.record_reconcile(ReconcileOutcome::Failure);
                backoff.on_failure()
            }
        }
    }

    /// Fetch assignments and apply the diff: stops first, then starts, then updates.
    ///
    /// Only the assignment poll can fail the pass. A failing start or stop is logged,
    /// counted in the report, and retried on the next pass if the task is still assigned.
    #[instrument(level = "debug", skip(self), fields(worker = %self.config.worker_id))]
    pub async fn reconcile(&self) -> Result<ReconcileReport, ControlPlaneError> {
        let mut report = ReconcileReport::default();
        if self.shutdown.is_cancelled() {
            return Ok(report);
        }

        let assigned = self.client.list_assignments(&self.config.worker_id).await?;
        let plan = {
            let running = self.tasks();
            ReconcilePlan::compute(running.values().map(|t| &t.assignment), &assigned)
        };
        trace!(
            stop = plan.stop.len(),
            start = plan.start.len(),
            update = plan.update.len(),
            "reconcile plan computed"
        );

        for task_id in &plan.stop {
            if self.stop_task(task_id).await {
                report.stopped += 1;
            }
        }
        for assignment in plan.start {
            let task_id = assignment.task_id.clone();
            match self.start_task(assignment).await {
                Ok(()) => report.started += 1,
                Err(CoreError::AlreadyRunning(_)) => {
                    debug!(task = %task_id, "task was started concurrently; skipping");
                }
                Err(e) => {
                    warn!(task = %task_id, error = %e, "failed to start task");
                    report.failed += 1;
                }
            }
        }
        for assignment in plan.update {
            let task_id = assignment.task_id.clone();
            match self.update_task(assignment).await {
                Ok(()) => report.updated += 1,
                Err(CoreError::AlreadyRunning(_)) => {
                    debug!(task = %task_id, "task was restarted concurrently; skipping");
                }
                Err(e) => {
                    warn!(task = %task_id, error = %e, "failed to restart updated task");
                    report.failed += 1;
                }
            }
        }

        self.metrics.set_running_tasks(self.tasks().len());
        Ok(report)
    }

    /// Fetch the task's context, bind its executor and schedule it.
    ///
    /// The map insert is compute-if-absent: if the id got scheduled meanwhile
    /// (e.g. by a concurrent reconcile), nothing is spawned and `AlreadyRunning` is returned.
    #[instrument(level = "debug", skip(self, assignment), fields(task = %assignment.task_id))]
    pub async fn start_task(&self, assignment: AssignmentDetails) -> Result<(), CoreError> {
        if self.shutdown.is_cancelled() {
            return Err(CoreError::ShuttingDown);
        }

        let context = self.client.execution_context(&assignment.task_id).await?;
        context.schedule.validate()?;
        let executor = self.registry.resolve(&context.params)?;
        if context.task_id != assignment.task_id {
            warn!(
                context_task = %context.task_id,
                "execution context carries a different task id; using the assigned one"
            );
        }

        let interval = context.schedule.interval();
        let kind = context.kind().to_string();
        let manager = Arc::new(TaskLifecycleManager::new(
            context,
            executor,
            Arc::clone(&self.client),
            self.config.account_id.clone(),
            self.counter.clone(),
            Arc::clone(&self.metrics),
        ));

        let mut running = self.tasks();
        if self.shutdown.is_cancelled() {
            return Err(CoreError::ShuttingDown);
        }
        match running.entry(assignment.task_id.clone()) {
            Entry::Occupied(_) => Err(CoreError::AlreadyRunning(assignment.task_id)),
            Entry::Vacant(slot) => {
                let handle = TaskHandle::spawn(Arc::clone(&manager), interval, Arc::clone(&self.pool));
                slot.insert(RunningTask {
                    handle,
                    manager,
                    assignment,
                });
                info!(kind = %kind, interval_ms = interval.as_millis() as u64, "task scheduled");
                Ok(())
            }
        }
    }

    /// Stop a task: remove it from the map, run executor cleanup, cancel its schedule.
    ///
    /// Cleanup is bounded by the task timeout, so a stuck executor delays the cancel by at most that long.
    /// Returns `false` (and does nothing) if the task was not running.
    #[instrument(level = "debug", skip(self), fields(task = %task_id))]
    pub async fn stop_task(&self, task_id: &TaskId) -> bool {
        let removed = self.tasks().remove(task_id);
        let Some(task) = removed else {
            trace!("task not running; nothing to stop");
            return false;
        };

        task.manager.stop().await;
        task.handle.cancel();
        info!("task stopped");
        true
    }

    /// Restart a task with a newer assignment.
    pub async fn update_task(&self, assignment: AssignmentDetails) -> Result<(), CoreError> {
        debug!(task = %assignment.task_id, updated = assignment.last_context_updated, "restarting task with new context");
        self.stop_task(&assignment.task_id).await;
        self.start_task(assignment).await
    }

    /// Stop accepting reconcile passes and drain every running task.
    ///
    /// Safe to call while a reconcile pass is in flight: starts that race with shutdown
    /// are refused under the map lock, so the drain loop always terminates.
    pub async fn shutdown(&self) {
        info!(worker = %self.config.worker_id, "scheduling worker shutting down");
        self.shutdown.cancel();

        loop {
            let ids: Vec<TaskId> = self.tasks().keys().cloned().collect();
            if ids.is_empty() {
                break;
            }
            for task_id in &ids {
                self.stop_task(task_id).await;
            }
        }
        self.metrics.set_running_tasks(0);

        if !self.counter.wait_idle(self.config.shutdown_grace()).await {
            warn!(
                in_flight = self.counter.current(),
                "executions still in flight after shutdown grace period"
            );
        }
        info!("scheduling worker stopped");
    }

    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TaskId, RunningTask>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
