use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder, proto::MetricFamily,
};

use ptask_core::{MetricsBackend, ReconcileOutcome, TaskOutcome};

const NAMESPACE: &str = "ptask";

/// Prometheus-backed [`MetricsBackend`].
///
/// Label cardinality is bounded by the number of registered task kinds:
/// - `kind`: executor discriminator, e.g. "subprocess"
/// - `outcome`: "success", "failure", "timeout", "error" (tasks) or "success", "retryable", "failure" (reconcile)
#[derive(Clone)]
pub struct PrometheusMetrics {
    tasks_started: CounterVec,
    tasks_completed: CounterVec,
    task_duration: HistogramVec,
    reconciles: IntCounterVec,
    running_tasks: IntGauge,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create the backend and register its collectors in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let tasks_started = CounterVec::new(
            Opts::new("tasks_started_total", "Task firings handed to an executor").namespace(NAMESPACE),
            &["kind"],
        )?;
        registry.register(Box::new(tasks_started.clone()))?;

        let tasks_completed = CounterVec::new(
            Opts::new("tasks_completed_total", "Task firings finished, by outcome").namespace(NAMESPACE),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(tasks_completed.clone()))?;

        let task_duration = HistogramVec::new(
            HistogramOpts::new("task_duration_seconds", "Wall-clock duration of one task firing")
                .namespace(NAMESPACE)
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
            &["kind"],
        )?;
        registry.register(Box::new(task_duration.clone()))?;

        let reconciles = IntCounterVec::new(
            Opts::new("reconcile_total", "Assignment reconcile passes, by outcome").namespace(NAMESPACE),
            &["outcome"],
        )?;
        registry.register(Box::new(reconciles.clone()))?;

        let running_tasks = IntGauge::with_opts(
            Opts::new("running_tasks", "Tasks currently scheduled on this worker").namespace(NAMESPACE),
        )?;
        registry.register(Box::new(running_tasks.clone()))?;

        Ok(Self {
            tasks_started,
            tasks_completed,
            task_duration,
            reconciles,
            running_tasks,
            registry,
        })
    }

    /// Create the backend with a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_task_started(&self, kind: &str) {
        self.tasks_started.with_label_values(&[kind]).inc();
    }

    fn record_task_completed(&self, kind: &str, outcome: TaskOutcome, duration_ms: u64) {
        self.tasks_completed
            .with_label_values(&[kind, outcome.as_label()])
            .inc();
        self.task_duration
            .with_label_values(&[kind])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_reconcile(&self, outcome: ReconcileOutcome) {
        self.reconciles.with_label_values(&[outcome.as_label()]).inc();
    }

    fn set_running_tasks(&self, count: usize) {
        self.running_tasks.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
        families
            .iter()
            .find(|f| f.name() == name)
            .unwrap_or_else(|| panic!("metric {name} not found"))
    }

    #[test]
    fn started_counter_is_labelled_by_kind() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_task_started("subprocess");
        metrics.record_task_started("subprocess");
        metrics.record_task_started("k8s-watch");

        let families = metrics.gather();
        assert_eq!(family(&families, "ptask_tasks_started_total").get_metric().len(), 2);
    }

    #[test]
    fn completion_feeds_counter_and_histogram() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_task_completed("subprocess", TaskOutcome::Success, 150);
        metrics.record_task_completed("subprocess", TaskOutcome::Timeout, 30_000);

        let families = metrics.gather();
        assert_eq!(family(&families, "ptask_tasks_completed_total").get_metric().len(), 2);
        assert_eq!(family(&families, "ptask_task_duration_seconds").get_metric().len(), 1);

        let text = metrics.encode_text().unwrap();
        assert!(
            text.contains(r#"ptask_task_duration_seconds_count{kind="subprocess"} 2"#),
            "{text}"
        );
    }

    #[test]
    fn reconcile_and_gauge_show_in_text_output() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_reconcile(ReconcileOutcome::Success);
        metrics.record_reconcile(ReconcileOutcome::Retryable);
        metrics.record_reconcile(ReconcileOutcome::Retryable);
        metrics.set_running_tasks(7);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains(r#"ptask_reconcile_total{outcome="retryable"} 2"#), "{text}");
        assert!(text.contains("ptask_running_tasks 7"), "{text}");
    }

    #[test]
    fn shared_registry_rejects_second_backend() {
        let registry = Arc::new(Registry::new());
        let _first = PrometheusMetrics::new_with_registry(registry.clone()).unwrap();
        assert!(PrometheusMetrics::new_with_registry(registry).is_err());
    }
}
