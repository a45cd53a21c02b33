//! Spawner for concurrent call handling with optional admission control.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Admission settings for a [`DispatchScheduler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerConfig {
    max_in_flight: Option<NonZeroUsize>,
}

impl SchedulerConfig {
    /// No limit on concurrently running calls.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_in_flight: None,
        }
    }

    /// At most `max_in_flight` calls run at once; extra calls wait for a slot.
    #[must_use]
    pub const fn bounded(max_in_flight: NonZeroUsize) -> Self {
        Self {
            max_in_flight: Some(max_in_flight),
        }
    }

    /// Returns the configured limit, if any.
    #[must_use]
    pub const fn max_in_flight(self) -> Option<NonZeroUsize> {
        self.max_in_flight
    }
}

/// Thin wrapper around `tokio::spawn` used by the serving loop.
///
/// Unbounded by default. With a limit configured, each spawned task waits for
/// a semaphore permit before running, so admission stays a separate policy
/// layer outside the executor.
#[derive(Debug, Clone)]
pub struct DispatchScheduler {
    permits: Option<Arc<Semaphore>>,
    in_flight: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    config: SchedulerConfig,
}

impl DispatchScheduler {
    /// Constructs a scheduler using the provided configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            permits: config
                .max_in_flight()
                .map(|limit| Arc::new(Semaphore::new(limit.get()))),
            in_flight: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Returns the associated configuration.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Number of spawned tasks that have not finished yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Returns `true` if the scheduler has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops accepting new tasks. Tasks already spawned run to completion.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Spawns `future`, honouring the configured admission limit.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] when the scheduler is closed.
    pub fn spawn<F, T>(&self, future: F) -> SchedulerResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(SchedulerError::Closed);
        }

        let permits = self.permits.clone();
        let guard = InFlightGuard::enter(Arc::clone(&self.in_flight));

        Ok(tokio::spawn(async move {
            let _guard = guard;
            // The semaphore is never closed, so acquisition cannot fail.
            let _permit = match permits {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            future.await
        }))
    }
}

impl Default for DispatchScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Scheduler is closed and will not accept new tasks.
    #[error("scheduler closed")]
    Closed,
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn run_batch(scheduler: &DispatchScheduler, tasks: usize) -> usize {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..tasks {
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            handles.push(
                scheduler
                    .spawn(async move {
                        let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(current, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .unwrap(),
            );
        }

        for handle in handles {
            handle.await.unwrap();
        }
        max_seen.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn bounded_respects_limit() {
        let scheduler = DispatchScheduler::new(SchedulerConfig::bounded(
            NonZeroUsize::new(2).unwrap(),
        ));
        assert_eq!(run_batch(&scheduler, 5).await, 2);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[tokio::test]
    async fn unbounded_runs_everything_at_once() {
        let scheduler = DispatchScheduler::default();
        assert!(scheduler.config().max_in_flight().is_none());
        assert_eq!(run_batch(&scheduler, 5).await, 5);
    }

    #[tokio::test]
    async fn close_prevents_new_tasks() {
        let scheduler = DispatchScheduler::default();
        scheduler.close();

        let result = scheduler.spawn(async move {});
        assert_eq!(result.unwrap_err(), SchedulerError::Closed);
    }
}
