//! Executor registry: task kind → executor instance, built once at startup.
use std::{collections::HashMap, fmt, sync::Arc};

use tracing::{debug, trace};

use ptask_model::TaskParams;

use crate::{error::CoreError, executor::TaskExecutor};

/// Mapping from a task kind (the `kind` discriminator in [`TaskParams`]) to its executor.
///
/// Built once at startup and shared read-only by the worker afterwards.
/// - every kind has exactly one executor; registering a kind twice is rejected;
/// - one executor instance may serve several kinds;
/// - an unknown kind is reported as [`CoreError::NoExecutor`] when a task starts, not at registration.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use async_trait::async_trait;
/// use ptask_core::{CoreError, ExecutorError, ExecutorRegistry, TaskExecutor};
/// use ptask_model::{Response, TaskId, TaskParams, Timestamp};
///
/// struct Echo;
///
/// #[async_trait]
/// impl TaskExecutor for Echo {
///     fn name(&self) -> &'static str {
///         "echo"
///     }
///
///     async fn run_once(&self, _: &TaskId, p: &TaskParams, _: Timestamp) -> Result<Response, ExecutorError> {
///         Ok(Response::ok(p.payload.to_string()))
///     }
///
///     async fn cleanup(&self, _: &TaskId, _: &TaskParams) -> Result<bool, ExecutorError> {
///         Ok(true)
///     }
/// }
///
/// let mut registry = ExecutorRegistry::new();
/// registry.register("echo", Arc::new(Echo)).unwrap();
///
/// let params = TaskParams::new("echo", serde_json::json!({}));
/// assert_eq!(registry.resolve(&params).unwrap().name(), "echo");
///
/// let unknown = TaskParams::new("aws-asg-sync", serde_json::json!({}));
/// assert!(matches!(registry.resolve(&unknown), Err(CoreError::NoExecutor(_))));
/// ```
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn TaskExecutor>>,
}

impl ExecutorRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor for `kind`.
    ///
    /// Registering the same kind twice is a wiring bug and is rejected.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<(), CoreError> {
        let kind = kind.into();
        if self.executors.contains_key(&kind) {
            return Err(CoreError::DuplicateExecutor(kind));
        }
        debug!(kind = %kind, executor = executor.name(), "executor registered");
        self.executors.insert(kind, executor);
        Ok(())
    }

    /// Look up the executor for a kind.
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn TaskExecutor>> {
        self.executors.get(kind)
    }

    /// Resolve the executor for the given params.
    pub fn resolve(&self, params: &TaskParams) -> Result<Arc<dyn TaskExecutor>, CoreError> {
        trace!(kind = %params.kind, "resolving executor");
        self.get(&params.kind)
            .cloned()
            .ok_or_else(|| CoreError::NoExecutor(params.kind.clone()))
    }

    /// Whether an executor is registered for `kind`.
    #[inline]
    pub fn contains(&self, kind: &str) -> bool {
        self.executors.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of registered kinds.
    #[inline]
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeExecutor;

    use serde_json::json;

    #[test]
    fn resolve_returns_registered_executor() {
        let mut registry = ExecutorRegistry::new();
        registry
            .register("k8s-sync", Arc::new(FakeExecutor::succeeding()))
            .unwrap();

        let params = TaskParams::new("k8s-sync", json!({}));
        let exec = registry.resolve(&params).expect("executor should resolve");
        assert_eq!(exec.name(), "fake");
    }

    #[test]
    fn resolve_fails_for_unknown_kind() {
        let registry = ExecutorRegistry::new();
        let params = TaskParams::new("ecs-sync", json!(null));

        match registry.resolve(&params) {
            Err(CoreError::NoExecutor(kind)) => assert_eq!(kind, "ecs-sync"),
            Ok(_) => panic!("expected NoExecutor, got Ok(..)"),
            Err(e) => panic!("expected NoExecutor, got {e:?}"),
        }
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let mut registry = ExecutorRegistry::new();
        registry
            .register("asg-sync", Arc::new(FakeExecutor::succeeding()))
            .unwrap();

        let err = registry
            .register("asg-sync", Arc::new(FakeExecutor::succeeding()))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateExecutor(k) if k == "asg-sync"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn one_executor_may_serve_many_kinds() {
        let shared: Arc<dyn TaskExecutor> = Arc::new(FakeExecutor::succeeding());
        let mut registry = ExecutorRegistry::new();
        registry.register("b", Arc::clone(&shared)).unwrap();
        registry.register("a", shared).unwrap();

        assert_eq!(registry.kinds(), vec!["a", "b"]);
        assert!(registry.contains("a"));
        assert!(!registry.contains("c"));
    }
}
