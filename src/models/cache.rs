use crate::models::period::Period;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cached horoscope text and the moment it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub value: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped at `fetched_at`, truncated to whole
    /// milliseconds to match the persisted representation.
    pub fn new(value: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        let fetched_at =
            DateTime::from_timestamp_millis(fetched_at.timestamp_millis()).unwrap_or(fetched_at);
        Self {
            value: value.into(),
            fetched_at,
        }
    }

    /// Fresh iff `now - fetched_at < max_age`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.fetched_at < max_age
    }
}

/// In-memory form of the persisted cache file.
pub type CacheMap = HashMap<String, CacheEntry>;

/// Composite key for a (category, period) pair.
pub fn cache_key(category: &str, period: Period) -> String {
    format!("{}_{}", category.to_lowercase(), period.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn freshness_boundary_is_stale() {
        let entry = CacheEntry::new("text", at(1_000));
        let max_age = Duration::seconds(60);
        assert!(entry.is_fresh_at(at(1_059), max_age));
        assert!(!entry.is_fresh_at(at(1_060), max_age));
        assert!(!entry.is_fresh_at(at(5_000), max_age));
    }

    #[test]
    fn serializes_fetched_at_as_millis() {
        let entry = CacheEntry::new("hello", at(1_700_000_000));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["value"], "hello");
        assert_eq!(json["fetchedAt"], 1_700_000_000_000i64);
    }

    #[test]
    fn key_combines_category_and_period() {
        assert_eq!(cache_key("Taurus", Period::Tomorrow), "taurus_tomorrow");
    }
}
