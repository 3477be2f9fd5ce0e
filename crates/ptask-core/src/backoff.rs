use std::time::Duration;

use rand::Rng;

use ptask_model::{BackoffStrategy, JitterStrategy};

/// Delay calculator for the reconcile loop.
///
/// Success and retryable outages keep the loop at `first_ms`.
/// Other failures grow the delay geometrically up to `max_ms`.
#[derive(Debug, Clone)]
pub struct ReconcileBackoff {
    strategy: BackoffStrategy,
    failures: u32,
    prev_ms: u64,
}

impl ReconcileBackoff {
    pub fn new(strategy: BackoffStrategy) -> Self {
        let prev_ms = strategy.first_ms;
        Self {
            strategy,
            failures: 0,
            prev_ms,
        }
    }

    /// Consecutive escalating failures seen since the last reset.
    #[inline]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The normal cadence.
    #[inline]
    pub fn first(&self) -> Duration {
        Duration::from_millis(self.strategy.first_ms)
    }

    /// Reset after a successful pass.
    pub fn on_success(&mut self) -> Duration {
        self.reset()
    }

    /// Control plane unreachable or slow: retry at the normal cadence.
    pub fn on_retryable(&mut self) -> Duration {
        self.reset()
    }

    /// Escalate after a non-retryable failure.
    pub fn on_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);

        let first = self.strategy.first_ms;
        let max = self.strategy.max_ms.max(first);
        let exp = self.failures.min(64) as i32;
        let base = (first as f64 * self.strategy.factor.powi(exp)).min(max as f64) as u64;

        let delay = self.jitter(base).clamp(first, max);
        self.prev_ms = delay;
        Duration::from_millis(delay)
    }

    fn reset(&mut self) -> Duration {
        self.failures = 0;
        self.prev_ms = self.strategy.first_ms;
        self.first()
    }

    fn jitter(&self, base: u64) -> u64 {
        let mut rng = rand::rng();
        match self.strategy.jitter {
            JitterStrategy::None => base,
            JitterStrategy::Full => rng.random_range(0..=base),
            JitterStrategy::Equal => {
                let half = base / 2;
                half + rng.random_range(0..=base - half)
            }
            JitterStrategy::Decorrelated => {
                let first = self.strategy.first_ms;
                let upper = self.prev_ms.saturating_mul(3).max(first);
                rng.random_range(first..=upper)
            }
        }
    }
}
