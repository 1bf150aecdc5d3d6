//! Process-wide limiter for calls to the Graph API.
//!
//! The platform enforces one quota per app, not per tenant, so a single
//! [`RateLimiter`] is created at startup and cloned into every call site.
//! Two mechanisms combine:
//!
//! - a fair (FIFO) semaphore bounds how many calls are in flight at once;
//! - a `governor` token bucket paces how many calls start per second.
//!
//! The limiter never retries. Per-call timeouts belong to the caller; the
//! in-flight slot is released when the wrapped future completes or is dropped.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use tokio::sync::Semaphore;

type GovernorRateLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct RateLimiter {
    slots: Arc<Semaphore>,
    pacer: Arc<GovernorRateLimiter>,
    max_in_flight: usize,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` call starts and at
    /// most `max_in_flight` concurrent calls. Zero values are raised to one.
    #[must_use]
    pub fn new(requests_per_second: u32, max_in_flight: usize) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let max_in_flight = max_in_flight.max(1);

        Self {
            slots: Arc::new(Semaphore::new(max_in_flight)),
            pacer: Arc::new(governor::RateLimiter::direct(Quota::per_second(rps))),
            max_in_flight,
        }
    }

    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Number of slots free right now.
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Runs `operation` once a slot is free and the pacing quota allows it.
    ///
    /// Waiters are admitted in arrival order. The slot is held for the whole
    /// of `operation` and released when it resolves or when the returned
    /// future is dropped (for example by an enclosing timeout).
    pub async fn execute<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // The semaphore is never closed, so acquisition only fails in theory.
        let _permit = self.slots.acquire().await.ok();
        self.pacer.until_ready().await;
        operation().await
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_in_flight", &self.max_in_flight)
            .field("available_slots", &self.available_slots())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn zero_limits_are_raised_to_one() {
        let limiter = RateLimiter::new(0, 0);
        assert_eq!(limiter.max_in_flight(), 1);
        assert_eq!(limiter.execute(|| async { 7 }).await, 7);
    }

    #[tokio::test]
    async fn bounds_concurrent_calls() {
        let limiter = RateLimiter::new(1_000, 2);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = limiter.clone();
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                limiter
                    .execute(|| async {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.expect("task panicked");
        }

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(limiter.available_slots(), 2);
    }

    #[tokio::test]
    async fn admits_waiters_in_arrival_order() {
        let limiter = RateLimiter::new(1_000, 1);
        let order = Arc::new(Mutex::new(Vec::new()));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let blocker = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter
                    .execute(|| async {
                        let _ = release_rx.await;
                    })
                    .await;
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(limiter.available_slots(), 0);

        let mut handles = Vec::new();
        for i in 0..4 {
            let limiter = limiter.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                limiter
                    .execute(|| async {
                        order.lock().expect("order lock").push(i);
                    })
                    .await;
            }));
            // Let each waiter enqueue before spawning the next one.
            tokio::task::yield_now().await;
        }

        release_tx.send(()).expect("blocker dropped");
        blocker.await.expect("blocker panicked");
        for handle in handles {
            handle.await.expect("task panicked");
        }

        assert_eq!(*order.lock().expect("order lock"), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn releases_slot_when_operation_fails() {
        let limiter = RateLimiter::new(1_000, 1);

        let result: Result<(), &str> = limiter.execute(|| async { Err("boom") }).await;
        assert!(result.is_err());
        assert_eq!(limiter.available_slots(), 1);

        let next = limiter.execute(|| async { "ok" }).await;
        assert_eq!(next, "ok");
    }

    #[tokio::test]
    async fn releases_slot_when_caller_times_out() {
        let limiter = RateLimiter::new(1_000, 1);

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            limiter.execute(std::future::pending::<()>),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(limiter.available_slots(), 1);

        let next = tokio::time::timeout(
            Duration::from_secs(1),
            limiter.execute(|| async { 42 }),
        )
        .await
        .expect("slot should have been released");
        assert_eq!(next, 42);
    }
}
