use crate::models::cache::CacheEntry;
use crate::models::event::FeedEvent;
use chrono::{DateTime, Utc};
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    pub fn format_event(&self, event: &FeedEvent) -> String {
        match event {
            FeedEvent::FetchSucceeded {
                category,
                period,
                text,
                from_cache,
            } => {
                let source = if *from_cache { "cache" } else { "fetched" };
                format!(
                    "{} {} {}\n{}",
                    format!("{} / {}", category, period).bright_white().bold(),
                    "✓".green(),
                    format!("({})", source).dimmed(),
                    text
                )
            }
            FeedEvent::FetchFailed {
                category,
                period,
                error_message,
            } => format!(
                "{} {} {}",
                format!("{} / {}", category, period).bright_white().bold(),
                "✗".red(),
                error_message.red()
            ),
            FeedEvent::CacheCleared => "Cache cleared".yellow().to_string(),
        }
    }

    pub fn format_age(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let secs = (now - fetched_at).num_seconds().max(0);
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86_400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
        }
    }

    pub fn format_freshness(&self, fresh: bool) -> String {
        if fresh {
            "fresh".green().to_string()
        } else {
            "stale".red().to_string()
        }
    }

    /// One row per entry: key, age, freshness and a text preview.
    pub fn format_cache_table(
        &self,
        entries: &[(String, CacheEntry, bool)],
        now: DateTime<Utc>,
    ) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.add_row(Row::new(
            ["Key", "Age", "Status", "Text"]
                .iter()
                .map(|h| Cell::new(h).style_spec("b"))
                .collect(),
        ));

        for (key, entry, fresh) in entries {
            table.add_row(Row::new(vec![
                Cell::new(key),
                Cell::new(&self.format_age(entry.fetched_at, now)),
                Cell::new(&self.format_freshness(*fresh)),
                Cell::new(&self.preview(&entry.value, 48)),
            ]));
        }

        table.to_string()
    }

    pub fn preview(&self, text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let cut: String = text.chars().take(max_chars).collect();
            format!("{}…", cut.trim_end())
        }
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_uses_largest_units() {
        let display = DisplayFormatter::new();
        let now = DateTime::from_timestamp(100_000, 0).unwrap();
        let at = |secs| DateTime::from_timestamp(secs, 0).unwrap();
        assert_eq!(display.format_age(at(99_990), now), "10s");
        assert_eq!(display.format_age(at(100_000 - 5 * 60), now), "5m");
        assert_eq!(display.format_age(at(100_000 - 3 * 3600 - 120), now), "3h 2m");
        assert_eq!(display.format_age(at(0), now), "1d 3h");
    }

    #[test]
    fn preview_truncates_long_text() {
        let display = DisplayFormatter::new();
        assert_eq!(display.preview("short", 10), "short");
        assert_eq!(display.preview("a long line of text", 6), "a long…");
    }
}
