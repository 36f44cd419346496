//! Retry wrapper around a [`ContentExtractor`].
//!
//! Each fetch is a sequential loop of at most `max_retries` attempts. Every
//! attempt is bounded by `attempt_timeout`; attempts are separated by the
//! fixed `retry_delay`. There is no exponential growth and no delay after
//! the final attempt.

use crate::api::extractor::ContentExtractor;
use crate::config::RetryPolicy;
use crate::error::{FeedError, Result};
use crate::models::period::Period;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

pub struct RetryingFetcher {
    inner: Arc<dyn ContentExtractor>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn ContentExtractor>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches text, retrying transient failures.
    ///
    /// Returns `MaxRetriesExceeded` wrapping the last error once all attempts
    /// fail. Non-transient errors are returned immediately.
    pub async fn fetch(&self, category: &str, period: Period) -> Result<String> {
        let max_attempts = self.policy.max_retries.max(1);
        let mut last_err = None;

        for attempt in 1..=max_attempts {
            match self.attempt(category, period).await {
                Ok(text) => {
                    debug!(category, %period, attempt, "Fetch succeeded");
                    return Ok(text);
                }
                Err(e) if e.is_transient() => {
                    if attempt < max_attempts {
                        warn!(
                            category,
                            %period,
                            attempt,
                            max_attempts,
                            delay_secs = self.policy.retry_delay.as_secs(),
                            error = %e,
                            "Fetch failed, retrying"
                        );
                        sleep(self.policy.retry_delay).await;
                    } else {
                        warn!(category, %period, attempt, error = %e, "Final fetch attempt failed");
                    }
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(FeedError::MaxRetriesExceeded {
            attempts: max_attempts,
            source: Box::new(last_err.unwrap_or_else(|| {
                FeedError::ContentUnavailable("no attempt was made".into())
            })),
        })
    }

    async fn attempt(&self, category: &str, period: Period) -> Result<String> {
        match timeout(self.policy.attempt_timeout, self.inner.extract(category, period)).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::ContentUnavailable(format!(
                "timed out after {}s",
                self.policy.attempt_timeout.as_secs()
            ))),
        }
    }
}
