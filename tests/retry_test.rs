mod common;

use async_trait::async_trait;
use common::FailThenSucceed;
use horoscope_feed::services::fetcher::RetryingFetcher;
use horoscope_feed::{ContentExtractor, FeedError, Period, Result, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn policy() -> RetryPolicy {
    RetryPolicy::new()
        .max_retries(3)
        .retry_delay(Duration::from_secs(300))
        .attempt_timeout(Duration::from_secs(30))
}

#[tokio::test(start_paused = true)]
async fn retries_with_fixed_delay_then_succeeds() {
    let inner = Arc::new(FailThenSucceed::new(2));
    let fetcher = RetryingFetcher::new(inner.clone(), policy());

    let start = Instant::now();
    let text = fetcher.fetch("taurus", Period::Daily).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(text, "taurus daily text");
    assert_eq!(inner.call_count(), 3); // 2 failures + 1 success
    assert!(elapsed >= Duration::from_secs(600));
    assert!(elapsed < Duration::from_secs(601));
}

#[tokio::test(start_paused = true)]
async fn first_attempt_success_has_no_delay() {
    let inner = Arc::new(FailThenSucceed::new(0));
    let fetcher = RetryingFetcher::new(inner.clone(), policy());

    let start = Instant::now();
    fetcher.fetch("leo", Period::Weekly).await.unwrap();

    assert_eq!(inner.call_count(), 1);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_retries() {
    let inner = Arc::new(FailThenSucceed::always_failing());
    let fetcher = RetryingFetcher::new(inner.clone(), policy());

    let start = Instant::now();
    let err = fetcher.fetch("leo", Period::Daily).await.unwrap_err();

    assert_eq!(inner.call_count(), 3);
    // No pause after the final attempt.
    assert!(start.elapsed() < Duration::from_secs(601));
    match err {
        FeedError::MaxRetriesExceeded { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, FeedError::ContentUnavailable(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Never answers within the attempt timeout.
struct Hanging {
    calls: AtomicU32,
}

#[async_trait]
impl ContentExtractor for Hanging {
    async fn extract(&self, _category: &str, _period: Period) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".into())
    }
}

#[tokio::test(start_paused = true)]
async fn attempt_timeout_counts_as_failure() {
    let inner = Arc::new(Hanging {
        calls: AtomicU32::new(0),
    });
    let fetcher = RetryingFetcher::new(inner.clone(), policy().max_retries(2));

    let err = fetcher.fetch("virgo", Period::Monthly).await.unwrap_err();

    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    assert!(err.to_string().contains("timed out after 30s"));
}

/// Fails with a non-retryable error.
struct Misconfigured {
    calls: AtomicU32,
}

#[async_trait]
impl ContentExtractor for Misconfigured {
    async fn extract(&self, _category: &str, _period: Period) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FeedError::ConfigInvalid("bad template".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn permanent_errors_are_not_retried() {
    let inner = Arc::new(Misconfigured {
        calls: AtomicU32::new(0),
    });
    let fetcher = RetryingFetcher::new(inner.clone(), policy());

    let err = fetcher.fetch("aries", Period::Daily).await.unwrap_err();

    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, FeedError::ConfigInvalid(_)));
}
