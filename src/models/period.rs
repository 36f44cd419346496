use crate::error::FeedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time scope of a horoscope text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Tomorrow,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Daily,
        Period::Tomorrow,
        Period::Weekly,
        Period::Monthly,
        Period::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Tomorrow => "tomorrow",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    /// Path fragment used by the remote site for this period.
    pub fn slug(&self) -> &'static str {
        match self {
            Period::Daily => "daily-today",
            Period::Tomorrow => "daily-tomorrow",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "today" => Ok(Period::Daily),
            "tomorrow" => Ok(Period::Tomorrow),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            other => Err(FeedError::ConfigInvalid(format!("unknown period '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!(" today ".parse::<Period>().unwrap(), Period::Daily);
    }

    #[test]
    fn rejects_unknown_period() {
        let err = "hourly".parse::<Period>().unwrap_err();
        assert!(matches!(err, FeedError::ConfigInvalid(_)));
    }
}
