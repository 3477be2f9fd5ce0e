use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    domain::TimeoutMs,
    error::{ModelError, ModelResult},
};

/// How often a task fires and how long a single firing may take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSchedule {
    /// Delay between the end of one firing and the start of the next.
    pub interval_ms: u64,
    /// Hard wall-clock limit for one firing.
    pub timeout_ms: TimeoutMs,
}

impl TaskSchedule {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Both values must be positive; a zero interval would spin.
    pub fn validate(&self) -> ModelResult<()> {
        if self.interval_ms == 0 {
            return Err(ModelError::InvalidSchedule("intervalMs must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ModelError::InvalidSchedule("timeoutMs must be positive".into()));
        }
        Ok(())
    }
}
