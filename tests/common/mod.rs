#![allow(dead_code)]

use async_trait::async_trait;
use horoscope_feed::{
    ContentExtractor, FeedConfig, FeedError, FeedEvent, Period, Result, RetryPolicy,
};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

/// Fails the first `failures` calls, then returns "<category> <period> text".
pub struct FailThenSucceed {
    remaining_failures: AtomicU32,
    total_calls: AtomicU32,
}

impl FailThenSucceed {
    pub fn new(failures: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
            total_calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(u32::MAX)
    }

    pub fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentExtractor for FailThenSucceed {
    async fn extract(&self, category: &str, period: Period) -> Result<String> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(FeedError::ContentUnavailable("remote down".into()));
        }
        Ok(format!("{} {} text", category, period))
    }
}

/// Records how many extract calls overlap.
pub struct ConcurrencyGauge {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    calls: AtomicUsize,
    latency: Duration,
}

impl ConcurrencyGauge {
    pub fn new(latency: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            latency,
        }
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentExtractor for ConcurrencyGauge {
    async fn extract(&self, category: &str, _period: Period) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("{} text", category))
    }
}

/// Config writing its cache into `dir`, with short delays.
pub fn test_config(dir: &TempDir) -> FeedConfig {
    FeedConfig::default()
        .cache_path(dir.path().join("cache.json"))
        .categories(["taurus", "leo", "virgo"])
        .periods(Period::ALL)
        .cooldown(Duration::from_secs(5))
        .retry(
            RetryPolicy::new()
                .max_retries(3)
                .retry_delay(Duration::from_secs(300))
                .attempt_timeout(Duration::from_secs(30)),
        )
}

/// Receives exactly `n` events, panicking if they do not arrive in time.
pub async fn collect_events(rx: &mut UnboundedReceiver<FeedEvent>, n: usize) -> Vec<FeedEvent> {
    let mut events = Vec::with_capacity(n);
    for _ in 0..n {
        let event = tokio::time::timeout(Duration::from_secs(24 * 3600), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        events.push(event);
    }
    events
}
