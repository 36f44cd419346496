//! Runtime configuration
//!
//! Defaults live in [`FeedConfig::default`]. A JSON file with kebab-case keys
//! can override any of them; durations in the file are given in seconds.

use crate::error::{FeedError, Result};
use crate::models::period::Period;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// The twelve signs, in the order the remote site numbers them.
pub const ZODIAC_SIGNS: [&str; 12] = [
    "aries",
    "taurus",
    "gemini",
    "cancer",
    "leo",
    "virgo",
    "libra",
    "scorpio",
    "sagittarius",
    "capricorn",
    "aquarius",
    "pisces",
];

const DEFAULT_SOURCE_URL: &str =
    "https://www.horoscope.com/us/horoscopes/general/horoscope-general-{period}.aspx?sign={sign}";
const DEFAULT_START_MARKER: &str = "<div class=\"main-horoscope\">";

/// Retry behaviour for a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Default: 3.
    pub max_retries: u32,
    /// Fixed pause between attempts. Default: 5 minutes.
    pub retry_delay: Duration,
    /// Upper bound on one extractor call. Default: 30s.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5 * 60),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

/// Where and how the HTTP extractor finds horoscope text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    /// URL template with `{category}`, `{period}` and `{sign}` placeholders.
    pub url_template: String,
    /// Markup that precedes the horoscope paragraph.
    pub start_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_SOURCE_URL.to_string(),
            start_marker: DEFAULT_START_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub cache_path: PathBuf,
    /// Freshness window for cached entries. Default: 12 hours.
    pub cache_duration: Duration,
    /// Number of concurrent worker slots. Default: 2.
    pub pool_size: usize,
    /// Pause a worker takes after contacting the remote source. Default: 5s.
    pub cooldown: Duration,
    pub retry: RetryPolicy,
    /// Interval of the bulk re-fetch. Default: 12 hours.
    pub bulk_refresh_interval: Duration,
    pub categories: Vec<String>,
    pub periods: Vec<Period>,
    pub source: SourceConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("horoscope_cache.json"),
            cache_duration: Duration::from_secs(12 * 60 * 60),
            pool_size: 2,
            cooldown: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            bulk_refresh_interval: Duration::from_secs(12 * 60 * 60),
            categories: ZODIAC_SIGNS.iter().map(|s| s.to_string()).collect(),
            periods: Period::ALL.to_vec(),
            source: SourceConfig::default(),
        }
    }
}

/// On-disk overrides; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    cache_path: Option<PathBuf>,
    cache_duration_secs: Option<u64>,
    pool_size: Option<usize>,
    cooldown_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_secs: Option<u64>,
    attempt_timeout_secs: Option<u64>,
    bulk_refresh_interval_secs: Option<u64>,
    categories: Option<Vec<String>>,
    periods: Option<Vec<Period>>,
    source_url: Option<String>,
    source_start_marker: Option<String>,
}

impl FeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration");
            let raw = std::fs::read_to_string(path).map_err(|e| {
                FeedError::ConfigInvalid(format!("cannot read {}: {}", path.display(), e))
            })?;
            config.apply_json(&raw)?;
        }
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    fn apply_json(&mut self, raw: &str) -> Result<()> {
        let file: FileConfig = serde_json::from_str(raw)
            .map_err(|e| FeedError::ConfigInvalid(format!("malformed config: {}", e)))?;

        if let Some(v) = file.cache_path {
            self.cache_path = v;
        }
        if let Some(v) = file.cache_duration_secs {
            self.cache_duration = Duration::from_secs(v);
        }
        if let Some(v) = file.pool_size {
            self.pool_size = v;
        }
        if let Some(v) = file.cooldown_secs {
            self.cooldown = Duration::from_secs(v);
        }
        if let Some(v) = file.max_retries {
            self.retry.max_retries = v;
        }
        if let Some(v) = file.retry_delay_secs {
            self.retry.retry_delay = Duration::from_secs(v);
        }
        if let Some(v) = file.attempt_timeout_secs {
            self.retry.attempt_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.bulk_refresh_interval_secs {
            self.bulk_refresh_interval = Duration::from_secs(v);
        }
        if let Some(v) = file.categories {
            self.categories = v.into_iter().map(|c| c.trim().to_lowercase()).collect();
        }
        if let Some(v) = file.periods {
            self.periods = v;
        }
        if let Some(v) = file.source_url {
            self.source.url_template = v;
        }
        if let Some(v) = file.source_start_marker {
            self.source.start_marker = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(FeedError::ConfigInvalid("pool-size must be at least 1".into()));
        }
        if self.retry.max_retries == 0 {
            return Err(FeedError::ConfigInvalid("max-retries must be at least 1".into()));
        }
        if self.categories.is_empty() {
            return Err(FeedError::ConfigInvalid("no categories configured".into()));
        }
        if self.periods.is_empty() {
            return Err(FeedError::ConfigInvalid("no periods configured".into()));
        }
        Ok(())
    }

    /// Normalized category name if it is configured.
    pub fn resolve_category(&self, name: &str) -> Result<String> {
        let name = name.trim().to_lowercase();
        if self.categories.contains(&name) {
            Ok(name)
        } else {
            Err(FeedError::ConfigInvalid(format!("unknown category '{}'", name)))
        }
    }

    /// Parsed period if it is configured.
    pub fn resolve_period(&self, name: &str) -> Result<Period> {
        let period: Period = name.parse()?;
        if self.periods.contains(&period) {
            Ok(period)
        } else {
            Err(FeedError::ConfigInvalid(format!("period '{}' is not enabled", period)))
        }
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn pool_size(mut self, n: usize) -> Self {
        self.pool_size = n;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn bulk_refresh_interval(mut self, interval: Duration) -> Self {
        self.bulk_refresh_interval = interval;
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories
            .into_iter()
            .map(|c| Into::<String>::into(c).to_lowercase())
            .collect();
        self
    }

    pub fn periods(mut self, periods: impl IntoIterator<Item = Period>) -> Self {
        self.periods = periods.into_iter().collect();
        self
    }

    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }
}
