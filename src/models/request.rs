use crate::models::cache::cache_key;
use crate::models::period::Period;
use std::fmt;

/// A single (category, period) fetch, consumed once by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub category: String,
    pub period: Period,
}

impl FetchRequest {
    pub fn new(category: impl Into<String>, period: Period) -> Self {
        Self {
            category: category.into(),
            period,
        }
    }

    pub fn cache_key(&self) -> String {
        cache_key(&self.category, self.period)
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.period)
    }
}
