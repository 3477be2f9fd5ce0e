use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// Number of executor invocations currently in flight across all tasks.
///
/// Cloning shares the same counter.
#[derive(Debug, Clone, Default)]
pub struct ExecutionCounter {
    inner: Arc<Inner>,
}

impl ExecutionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one invocation until the returned guard is dropped.
    #[must_use = "the invocation is only counted while the guard is alive"]
    pub fn enter(&self) -> ExecutionGuard {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        ExecutionGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Wait until no invocation is in flight, or `timeout` passes.
    ///
    /// Returns `true` if the counter reached zero.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.inner.idle.notified();
                if self.current() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

/// Decrements the shared counter exactly once, when dropped.
///
/// Dropping happens on normal return, on timeout, on error and when the
/// surrounding future is cancelled, so no path can leak or double-release a count.
#[derive(Debug)]
pub struct ExecutionGuard {
    inner: Arc<Inner>,
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_once() {
        let counter = ExecutionCounter::new();
        let a = counter.enter();
        let b = counter.enter();
        assert_eq!(counter.current(), 2);

        drop(a);
        assert_eq!(counter.current(), 1);
        drop(b);
        assert_eq!(counter.current(), 0);
    }

    #[test]
    fn clones_share_state() {
        let counter = ExecutionCounter::new();
        let other = counter.clone();
        let _g = other.enter();
        assert_eq!(counter.current(), 1);
    }

    #[tokio::test]
    async fn wait_idle_returns_when_last_guard_drops() {
        let counter = ExecutionCounter::new();
        let guard = counter.enter();

        let waiter = {
            let counter = counter.clone();
            tokio::spawn(async move { counter.wait_idle(Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;
        drop(guard);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_idle_times_out_while_busy() {
        let counter = ExecutionCounter::new();
        let _guard = counter.enter();
        assert!(!counter.wait_idle(Duration::from_millis(50)).await);
    }
}
