use crate::models::period::Period;

/// Outcome notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    FetchSucceeded {
        category: String,
        period: Period,
        text: String,
        from_cache: bool,
    },
    FetchFailed {
        category: String,
        period: Period,
        error_message: String,
    },
    CacheCleared,
}

impl FeedEvent {
    /// The (category, period) pair this event reports on, if any.
    pub fn subject(&self) -> Option<(&str, Period)> {
        match self {
            FeedEvent::FetchSucceeded {
                category, period, ..
            }
            | FeedEvent::FetchFailed {
                category, period, ..
            } => Some((category.as_str(), *period)),
            FeedEvent::CacheCleared => None,
        }
    }
}
