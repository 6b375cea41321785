//! # Lifetime Extension
//!
//! Cache writes scheduled by a strategy must not hold up the response, but
//! the host still has to know when they finish. Strategies hand each such
//! write to a [`LifetimeExtender`] as a [`BackgroundTask`]; the engine never
//! keeps background work alive by itself.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::task::{JoinError, JoinSet};

use crate::error::{Result, StrategyError};

/// Failures reaped before a drain that are kept for it. Older ones have
/// already been logged and are dropped first.
const MAX_RETAINED_FAILURES: usize = 256;

/// Work that must complete after `handle` has returned.
pub type BackgroundTask = BoxFuture<'static, Result<()>>;

/// Host capability that keeps background tasks alive and tracked.
pub trait LifetimeExtender: Send + Sync {
    fn wait_until(&self, task: BackgroundTask);
}

/// Spawns background tasks onto the tokio runtime.
///
/// Finished tasks are reaped whenever a new one is registered, so a
/// long-running host only holds the tasks still in flight. Failures found
/// while reaping are logged and kept for [`TaskRegistry::drain`].
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<JoinSet<Result<()>>>,
    failures: Mutex<VecDeque<StrategyError>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks registered whose outcome has not been collected yet.
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Wait for every registered task, including ones registered while
    /// draining, and return the failures.
    pub async fn drain(&self) -> Vec<StrategyError> {
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks.lock());
            if tasks.is_empty() {
                break;
            }
            while let Some(outcome) = tasks.join_next().await {
                self.record(outcome);
            }
        }

        self.failures.lock().drain(..).collect()
    }

    fn record(&self, outcome: std::result::Result<Result<()>, JoinError>) {
        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Background task failed");
                e
            }
            Err(e) => {
                tracing::warn!(error = %e, "Background task aborted");
                StrategyError::BackgroundTask(e.to_string())
            }
        };

        let mut failures = self.failures.lock();
        if failures.len() == MAX_RETAINED_FAILURES {
            failures.pop_front();
        }
        failures.push_back(failure);
    }
}

impl LifetimeExtender for TaskRegistry {
    fn wait_until(&self, task: BackgroundTask) {
        let mut tasks = self.tasks.lock();
        while let Some(outcome) = tasks.try_join_next() {
            self.record(outcome);
        }
        tasks.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StoreError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_collects_failures() {
        let registry = TaskRegistry::new();
        registry.wait_until(Box::pin(async { Ok(()) }));
        registry.wait_until(Box::pin(async {
            Err(StrategyError::CacheWrite(StoreError::QuotaExceeded {
                cache_name: "images".to_string(),
            }))
        }));
        assert_eq!(registry.pending(), 2);

        let failures = registry.drain().await;

        assert_eq!(registry.pending(), 0);
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0],
            StrategyError::CacheWrite(StoreError::QuotaExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_finished_tasks_are_reaped() {
        let registry = TaskRegistry::new();
        for _ in 0..100 {
            registry.wait_until(Box::pin(async { Ok(()) }));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        registry.wait_until(Box::pin(async { Ok(()) }));

        assert_eq!(registry.pending(), 1);
    }

    #[tokio::test]
    async fn test_reaped_failure_still_reported_by_drain() {
        let registry = TaskRegistry::new();
        registry.wait_until(Box::pin(async {
            Err(StrategyError::BackgroundTask("lost write".to_string()))
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        registry.wait_until(Box::pin(async { Ok(()) }));
        assert_eq!(registry.pending(), 1);

        let failures = registry.drain().await;

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], StrategyError::BackgroundTask(_)));
    }

    #[tokio::test]
    async fn test_drain_empty_registry() {
        assert!(TaskRegistry::new().drain().await.is_empty());
    }
}
