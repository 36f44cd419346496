//! Error types for the horoscope feed

/// Errors produced while fetching, caching or configuring the feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The remote page could not be fetched or did not contain the expected text.
    #[error("content unavailable: {0}")]
    ContentUnavailable(String),

    /// Every attempt failed. Carries the error of the final attempt.
    #[error("gave up after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        source: Box<FeedError>,
    },

    #[error("cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown category or period, or an unusable configuration value.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl FeedError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::ContentUnavailable(_))
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::ContentUnavailable(format!("request timed out: {}", err))
        } else if let Some(status) = err.status() {
            FeedError::ContentUnavailable(format!("remote returned {}", status))
        } else {
            FeedError::ContentUnavailable(err.to_string())
        }
    }
}

/// Result type alias for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
