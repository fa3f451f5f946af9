//! Tests for the per-URL revisit limiter
//!
//! Timestamps are passed explicitly so the tests never depend on the wall
//! clock.

use indexer_worker::indexer_engine::{RateLimitDecision, RateLimiter};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

const URL: &str = "https://shop.test/p/1";

fn limiter() -> RateLimiter {
    RateLimiter::new(Duration::from_millis(15_000))
}

#[test]
fn test_first_visit_allowed_and_recorded() {
    let limiter = limiter();

    assert_eq!(limiter.check_and_mark_at(URL, 1_000), RateLimitDecision::Allow);
    assert_eq!(limiter.last_indexed(URL), Some(1_000));
    assert_eq!(limiter.tracked_count(), 1);
}

#[test]
fn test_revisit_denied_with_remaining_wait() {
    let limiter = limiter();
    limiter.check_and_mark_at(URL, 1_000);

    assert_eq!(
        limiter.check_and_mark_at(URL, 5_000),
        RateLimitDecision::Deny {
            retry_after: Duration::from_millis(11_000)
        }
    );
}

#[test]
fn test_denial_does_not_move_timestamp() {
    let limiter = limiter();
    limiter.check_and_mark_at(URL, 0);

    // Repeated early attempts must not push the window forward
    limiter.check_and_mark_at(URL, 10_000);
    limiter.check_and_mark_at(URL, 14_000);
    assert_eq!(limiter.last_indexed(URL), Some(0));

    assert_eq!(limiter.check_and_mark_at(URL, 15_000), RateLimitDecision::Allow);
    assert_eq!(limiter.last_indexed(URL), Some(15_000));
}

#[test]
fn test_urls_are_independent() {
    let limiter = limiter();

    assert_eq!(limiter.check_and_mark_at(URL, 0), RateLimitDecision::Allow);
    assert_eq!(
        limiter.check_and_mark_at("https://shop.test/p/2", 1),
        RateLimitDecision::Allow
    );
    // Query strings make a distinct URL
    assert_eq!(
        limiter.check_and_mark_at("https://shop.test/p/1?variant=blue", 2),
        RateLimitDecision::Allow
    );
    assert!(matches!(
        limiter.check_and_mark_at(URL, 3),
        RateLimitDecision::Deny { .. }
    ));
}

#[test]
fn test_explicit_interval_overrides_default() {
    let limiter = limiter();
    limiter.check_and_mark_at(URL, 0);

    assert_eq!(
        limiter.check_and_mark_with(URL, 61_000, Duration::from_secs(60)),
        RateLimitDecision::Allow
    );
    assert_eq!(
        limiter.check_and_mark_with(URL, 62_000, Duration::from_secs(60)),
        RateLimitDecision::Deny {
            retry_after: Duration::from_millis(59_000)
        }
    );
}

#[test]
fn test_clock_going_backwards_counts_as_recent() {
    let limiter = limiter();
    limiter.check_and_mark_at(URL, 50_000);

    assert_eq!(
        limiter.check_and_mark_at(URL, 40_000),
        RateLimitDecision::Deny {
            retry_after: Duration::from_millis(15_000)
        }
    );
}

#[test]
fn test_injected_clock_drives_check_and_mark() {
    let now = Arc::new(AtomicI64::new(100));
    let source = now.clone();
    let limiter = RateLimiter::with_clock(
        Duration::from_millis(500),
        Arc::new(move || source.load(Ordering::SeqCst)),
    );

    assert_eq!(limiter.check_and_mark(URL), RateLimitDecision::Allow);
    now.store(400, Ordering::SeqCst);
    assert_eq!(
        limiter.check_and_mark(URL),
        RateLimitDecision::Deny {
            retry_after: Duration::from_millis(200)
        }
    );
    now.store(600, Ordering::SeqCst);
    assert_eq!(limiter.check_and_mark(URL), RateLimitDecision::Allow);
    assert_eq!(limiter.now(), 600);
}

#[test]
fn test_clear_forgets_visits() {
    let limiter = limiter();
    limiter.check_and_mark_at(URL, 0);
    limiter.clear();

    assert_eq!(limiter.tracked_count(), 0);
    assert_eq!(limiter.check_and_mark_at(URL, 1), RateLimitDecision::Allow);
}

#[tokio::test]
async fn test_concurrent_checks_admit_exactly_one() {
    let limiter = Arc::new(limiter());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.check_and_mark_at(URL, 7) })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() == RateLimitDecision::Allow {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 1);
}
