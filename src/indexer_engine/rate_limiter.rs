//! Per-URL revisit limiter
//!
//! Tracks when each URL was last indexed and defers jobs that arrive before
//! the minimum interval has passed. A deferral carries the remaining wait so
//! the queue can resubmit the job exactly when it becomes eligible.
//!
//! Check-and-mark is a single `DashMap` entry operation, so two workers can
//! never both pass the gate for the same URL. Entries are never evicted;
//! the table lives as long as the process.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Rate limit decision for an indexing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed to proceed; the visit has been recorded
    Allow,
    /// Request should be deferred
    /// Contains the duration to wait before retrying
    Deny { retry_after: Duration },
}

/// Source of "now" in milliseconds since the Unix epoch
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall clock backed by `chrono`
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

/// URL → last-indexed timestamp table with a minimum revisit interval
pub struct RateLimiter {
    last_indexed: DashMap<String, i64>,
    min_interval: Duration,
    clock: Clock,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("min_interval", &self.min_interval)
            .field("tracked", &self.last_indexed.len())
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Limiter on the system clock
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, system_clock())
    }

    #[must_use]
    pub fn with_clock(min_interval: Duration, clock: Clock) -> Self {
        Self {
            last_indexed: DashMap::new(),
            min_interval,
            clock,
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Check `url` against the default interval at the current time
    pub fn check_and_mark(&self, url: &str) -> RateLimitDecision {
        self.check_and_mark_at(url, (self.clock)())
    }

    /// Check `url` against the default interval at `now_ms`
    pub fn check_and_mark_at(&self, url: &str, now_ms: i64) -> RateLimitDecision {
        self.check_and_mark_with(url, now_ms, self.min_interval)
    }

    /// Check `url` at `now_ms` with an explicit interval
    ///
    /// Denials leave the recorded timestamp untouched, so the wait is always
    /// measured from the last visit that actually happened.
    pub fn check_and_mark_with(&self, url: &str, now_ms: i64, interval: Duration) -> RateLimitDecision {
        let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);

        match self.last_indexed.entry(url.to_string()) {
            Entry::Occupied(mut entry) => {
                // A clock step backwards counts as "just visited"
                let elapsed = now_ms.saturating_sub(*entry.get()).max(0);
                if elapsed < interval_ms {
                    let wait = u64::try_from(interval_ms - elapsed).unwrap_or(0);
                    RateLimitDecision::Deny {
                        retry_after: Duration::from_millis(wait),
                    }
                } else {
                    entry.insert(now_ms);
                    RateLimitDecision::Allow
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now_ms);
                RateLimitDecision::Allow
            }
        }
    }

    /// Current time according to this limiter's clock
    #[must_use]
    pub fn now(&self) -> i64 {
        (self.clock)()
    }

    #[must_use]
    pub fn last_indexed(&self, url: &str) -> Option<i64> {
        self.last_indexed.get(url).map(|entry| *entry.value())
    }

    /// Number of URLs currently tracked
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.last_indexed.len()
    }

    pub fn clear(&self) {
        self.last_indexed.clear();
    }
}
