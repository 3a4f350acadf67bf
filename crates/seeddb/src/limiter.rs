//! Token-bucket pacing for outgoing requests
//!
//! Tokens refill lazily from elapsed time whenever a caller tries to take
//! one; there is no background timer. One limiter is shared by every lookup
//! of a [`Client`](crate::Client), so the server sees a single aggregate rate.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

/// Bucket state, only touched with the limiter's lock held
#[derive(Debug)]
struct Bucket {
    /// Refill rate in tokens per second
    rate: f64,
    /// Maximum number of banked tokens
    burst: f64,
    /// Currently banked tokens, within 0..=burst
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        if self.rate.is_infinite() {
            self.tokens = self.burst;
        } else if self.rate > 0.0 {
            let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
            self.tokens = (self.tokens + elapsed * self.rate).min(self.burst);
        }
        self.last_refill = now;
    }

    /// Take one token, or report how long until one is available.
    ///
    /// `Err(None)` means the bucket never refills at the current rate
    /// (zero, negative, NaN, or too small to wait for).
    fn take(&mut self, now: Instant) -> std::result::Result<(), Option<Duration>> {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }
        if self.rate.is_nan() || self.rate <= 0.0 {
            return Err(None);
        }
        let seconds_needed = (1.0 - self.tokens) / self.rate;
        // A wait too long for Duration is treated as never.
        Err(Duration::try_from_secs_f64(seconds_needed).ok())
    }
}

/// Queries-per-second ceiling with cancellable waits
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    /// Wakes sleeping waiters when the rate changes
    changed: Notify,
}

impl RateLimiter {
    /// Create a limiter refilling `rate` tokens per second, banking at most
    /// `burst` (at least 1). The bucket starts full.
    pub fn new(rate: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            bucket: Mutex::new(Bucket {
                rate,
                burst,
                tokens: burst,
                last_refill: Instant::now(),
            }),
            changed: Notify::new(),
        }
    }

    /// Wait until a token is available and consume it.
    ///
    /// Returns [`Error::Cancelled`] right away if `cancel` has already fired,
    /// or as soon as it fires while waiting.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            // Registered before checking so a concurrent set_limit is not missed.
            let changed = self.changed.notified();
            let delay = match self.bucket.lock().take(Instant::now()) {
                Ok(()) => return Ok(()),
                Err(delay) => delay,
            };

            match delay {
                Some(delay) => {
                    debug!(delay_ms = delay.as_millis() as u64, "Waiting for rate limiter");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = changed => {}
                        _ = sleep(delay) => {}
                    }
                }
                None => {
                    debug!("Rate limiter closed, waiting for a new limit");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = changed => {}
                    }
                }
            }
        }
    }

    /// Take a token if one is banked, without waiting
    pub fn try_acquire(&self) -> bool {
        self.bucket.lock().take(Instant::now()).is_ok()
    }

    /// Change the refill rate. Banked tokens are kept.
    pub fn set_limit(&self, rate: f64) {
        {
            let mut bucket = self.bucket.lock();
            bucket.refill(Instant::now());
            bucket.rate = rate;
        }
        self.changed.notify_waiters();
    }

    /// Current refill rate in tokens per second
    pub fn limit(&self) -> f64 {
        self.bucket.lock().rate
    }

    /// Tokens currently banked
    pub fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        bucket.refill(Instant::now());
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_wait_paces_requests() {
        let limiter = RateLimiter::new(1.0, 1);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        limiter.wait(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(10));

        limiter.wait(&cancel).await.unwrap();
        limiter.wait(&cancel).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(2100), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_banked() {
        let limiter = RateLimiter::new(1.0, 3);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.wait(&cancel).await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(10));
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!((limiter.available() - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let limiter = RateLimiter::new(1.0, 1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(limiter.wait(&cancel).await, Err(Error::Cancelled));
        assert!(limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() {
        let limiter = RateLimiter::new(0.001, 1);
        let cancel = CancellationToken::new();
        assert!(limiter.try_acquire());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        assert_eq!(limiter.wait(&cancel).await, Err(Error::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_limit_wakes_waiter() {
        let limiter = Arc::new(RateLimiter::new(0.0, 1));
        let cancel = CancellationToken::new();
        assert!(limiter.try_acquire());

        let relax = Arc::clone(&limiter);
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            relax.set_limit(f64::INFINITY);
        });

        let start = Instant::now();
        limiter.wait(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(limiter.limit().is_infinite());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_rates_wait_for_new_limit() {
        for rate in [1e-30, f64::NAN, -1.0] {
            let limiter = RateLimiter::new(rate, 1);
            let cancel = CancellationToken::new();
            assert!(limiter.try_acquire());
            assert!(!limiter.try_acquire());

            let waited = timeout(Duration::from_millis(10), limiter.wait(&cancel)).await;
            assert!(waited.is_err(), "rate {rate} should block");

            cancel.cancel();
            assert_eq!(limiter.wait(&cancel).await, Err(Error::Cancelled));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiny_rate_recovers_after_set_limit() {
        let limiter = Arc::new(RateLimiter::new(1e-30, 1));
        assert!(limiter.try_acquire());

        let relax = Arc::clone(&limiter);
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            relax.set_limit(10.0);
        });

        let start = Instant::now();
        limiter.wait(&CancellationToken::new()).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_limit_keeps_tokens() {
        let limiter = RateLimiter::new(1.0, 2);
        assert!(limiter.try_acquire());

        limiter.set_limit(100.0);
        assert!((limiter.available() - 1.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_rate() {
        let limiter = Arc::new(RateLimiter::new(10.0, 1));
        let start = Instant::now();

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.wait(&CancellationToken::new()).await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(400));
    }
}
