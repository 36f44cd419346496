use crate::config::{SourceConfig, ZODIAC_SIGNS};
use crate::error::{FeedError, Result};
use crate::models::period::Period;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Produces the raw horoscope text for a (category, period) pair.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, category: &str, period: Period) -> Result<String>;
}

/// Scrapes horoscope text from a web page.
pub struct HttpExtractor {
    client: Client,
    source: SourceConfig,
}

impl HttpExtractor {
    pub fn new(source: SourceConfig) -> Self {
        Self::with_client(Client::new(), source)
    }

    /// Client that gives up on a single request after `timeout`.
    pub fn with_timeout(source: SourceConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, source))
    }

    pub fn with_client(client: Client, source: SourceConfig) -> Self {
        Self { client, source }
    }

    pub fn url_for(&self, category: &str, period: Period) -> String {
        let sign = ZODIAC_SIGNS
            .iter()
            .position(|s| s.eq_ignore_ascii_case(category))
            .map(|i| (i + 1).to_string())
            .unwrap_or_else(|| category.to_string());
        self.source
            .url_template
            .replace("{category}", category)
            .replace("{period}", period.slug())
            .replace("{sign}", &sign)
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, category: &str, period: Period) -> Result<String> {
        let url = self.url_for(category, period);
        debug!("Sending request to {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;

        extract_text(&body, &self.source.start_marker).ok_or_else(|| {
            FeedError::ContentUnavailable(format!("no horoscope text found at {}", url))
        })
    }
}

/// First paragraph after `marker`, with markup stripped and whitespace
/// collapsed. `None` when the marker, the paragraph or its text is missing.
pub fn extract_text(html: &str, marker: &str) -> Option<String> {
    let region = &html[html.find(marker)? + marker.len()..];
    let open = find_paragraph(region)?;
    let after_open = &region[open..];
    let content_start = after_open.find('>')? + 1;
    let content = &after_open[content_start..];
    let content = match content.find("</p>") {
        Some(end) => &content[..end],
        None => content,
    };

    let text = collapse_whitespace(&decode_entities(&strip_tags(content)));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Offset of the first `<p>` or `<p ...>` tag, skipping `<pre>`, `<param>` and the like.
fn find_paragraph(html: &str) -> Option<usize> {
    html.match_indices("<p").map(|(i, _)| i).find(|&i| {
        html[i + 2..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c.is_ascii_whitespace())
    })
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    // Tags removed mid-sentence leave a space before punctuation.
    joined
        .replace(" ,", ",")
        .replace(" .", ".")
        .replace(" :", ":")
}
