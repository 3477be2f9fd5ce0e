use std::time::Duration;

use serde::{Deserialize, Serialize};

use ptask_model::{AccountId, BackoffStrategy, WorkerId};

use crate::error::CoreError;

/// Shared execution pool size.
const DEFAULT_MAX_CONCURRENT_EXECUTIONS: usize = 40;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 10_000;

/// Scheduling worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    /// Identity used when asking the control plane for assignments.
    ///
    /// A random id is generated when absent.
    pub worker_id: WorkerId,
    /// Account attached to every failure report.
    pub account_id: AccountId,
    /// Reconcile cadence window.
    pub backoff: BackoffStrategy,
    /// Upper bound on executor invocations running at the same time, across all tasks.
    pub max_concurrent_executions: usize,
    /// How long `shutdown` waits for in-flight invocations after the task map is drained.
    pub shutdown_grace_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: WorkerId::generate(),
            account_id: AccountId::default(),
            backoff: BackoffStrategy::default(),
            max_concurrent_executions: DEFAULT_MAX_CONCURRENT_EXECUTIONS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.backoff.validate()?;
        if self.max_concurrent_executions == 0 {
            return Err(CoreError::Config(
                "maxConcurrentExecutions must be positive".into(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = WorkerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_concurrent_executions, 40);
        assert_eq!(cfg.shutdown_grace(), Duration::from_secs(10));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: WorkerConfig =
            serde_json::from_str(r#"{"workerId": "delegate-7", "accountId": "acc"}"#).unwrap();
        assert_eq!(cfg.worker_id.as_str(), "delegate-7");
        assert_eq!(cfg.account_id.as_str(), "acc");
        assert_eq!(cfg.backoff, BackoffStrategy::default());
    }

    #[test]
    fn zero_pool_is_rejected() {
        let cfg = WorkerConfig {
            max_concurrent_executions: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn bad_backoff_is_rejected() {
        let mut cfg = WorkerConfig::default();
        cfg.backoff.first_ms = 0;
        assert!(matches!(cfg.validate(), Err(CoreError::Model(_))));
    }
}
