//! Politeness and concurrency control
//!
//! Two independent limits apply to every fetch:
//! - at most `max_workers` fetches are in flight at once (a semaphore)
//! - successive dispatches are at least `min_delay` apart, globally
//!
//! The delay throttles admission into flight; it does not lower the ceiling.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Shared dispatch gate for all fetches of one crawl
#[derive(Debug, Clone)]
pub struct Politeness {
    permits: Arc<Semaphore>,
    min_delay: Duration,
    last_dispatch: Arc<Mutex<Option<Instant>>>,
}

/// Proof that a fetch was admitted; releases its worker slot on drop
#[derive(Debug)]
pub struct DispatchSlot {
    _permit: OwnedSemaphorePermit,
    dispatched_at: Instant,
}

impl DispatchSlot {
    /// When this fetch was allowed to start
    pub fn dispatched_at(&self) -> Instant {
        self.dispatched_at
    }
}

impl Politeness {
    /// Creates a gate allowing `max_workers` concurrent fetches
    ///
    /// A `max_workers` of zero is treated as one.
    pub fn new(max_workers: usize, min_delay: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
            min_delay,
            last_dispatch: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until a fetch may be dispatched
    ///
    /// Compares the time since the last dispatch against `min_delay`, sleeps
    /// for the remainder, then records the new dispatch time. The timestamp
    /// lock is held across the sleep so waiters are released one at a time,
    /// in arrival order.
    pub async fn acquire(&self) -> DispatchSlot {
        // The semaphore is never closed
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("politeness semaphore closed"),
        };

        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                let remaining = self.min_delay - elapsed;
                tracing::trace!("Politeness delay {:?}", remaining);
                tokio::time::sleep(remaining).await;
            }
        }

        let dispatched_at = Instant::now();
        *last = Some(dispatched_at);
        drop(last);

        DispatchSlot {
            _permit: permit,
            dispatched_at,
        }
    }

    /// Runs `operation` once a dispatch slot is available
    ///
    /// The worker slot is held until the operation completes.
    pub async fn dispatch<F, T>(&self, operation: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let _slot = self.acquire().await;
        operation.await
    }
}

/// Calculates the delay between dispatches
///
/// Uses the larger of the configured request delay and the robots.txt
/// crawl delay (if specified).
pub fn effective_delay(config_delay: Duration, robots_delay: Option<Duration>) -> Duration {
    std::cmp::max(config_delay, robots_delay.unwrap_or_default())
}
