//! Per-key request gating built on [`BoundedCache::test_and_set`]

use std::time::{Duration, Instant};

use crate::bounded::BoundedCache;

/// Allows at most one request per key within `min_delay`.
///
/// The last allowed time of each key lives in a [`BoundedCache`], so a key
/// that has been evicted is treated as never seen.
#[derive(Debug)]
pub struct AccessGate {
    last_allowed: BoundedCache<Instant>,
    min_delay: Duration,
}

impl AccessGate {
    /// Create a gate tracking up to `capacity` keys
    pub fn new(capacity: usize, min_delay: Duration) -> Self {
        Self {
            last_allowed: BoundedCache::new(capacity),
            min_delay,
        }
    }

    /// Decide whether a request for `key` at `now` may proceed.
    ///
    /// An allowed request records `now` as the key's last allowed time.
    /// Concurrent callers for the same key cannot both be allowed.
    pub fn allow(&self, key: &str, now: Instant) -> bool {
        let min_delay = self.min_delay;
        self.last_allowed
            .test_and_set(key, now, |last| now.saturating_duration_since(*last) >= min_delay)
    }

    /// Minimum delay between allowed requests for one key
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_spacing() {
        let gate = AccessGate::new(16, Duration::from_secs(3));
        let start = Instant::now();
        let at = |secs| start + Duration::from_secs(secs);

        assert!(gate.allow("client", at(0)));
        assert!(!gate.allow("client", at(1)));
        assert!(!gate.allow("client", at(2)));
        assert!(gate.allow("client", at(3)));
        assert!(!gate.allow("client", at(4)));
    }

    #[test]
    fn test_gate_keys_independent() {
        let gate = AccessGate::new(16, Duration::from_secs(3));
        let now = Instant::now();

        assert!(gate.allow("a", now));
        assert!(gate.allow("b", now));
        assert!(!gate.allow("a", now));
    }

    #[test]
    fn test_gate_denied_request_does_not_reset_window() {
        let gate = AccessGate::new(16, Duration::from_secs(3));
        let start = Instant::now();

        assert!(gate.allow("k", start));
        assert!(!gate.allow("k", start + Duration::from_secs(2)));
        assert!(gate.allow("k", start + Duration::from_secs(3)));
    }
}
