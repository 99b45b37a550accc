//! Discussion threads from Reddit's public `search.json` listing.
//!
//! No credentials are needed, but anonymous clients are throttled, so a
//! fetch retries a few times before giving up.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use serde_json::Value;

use crate::config::{RedditConfig, SourcesConfig};
use crate::error::SourceError;
use crate::http::{build_client, get_json};
use crate::source::ContentSource;
use crate::types::{ContentItem, ItemKind, Metric, SourceKind};

use super::{endpoint, str_field};

const PERMALINK_BASE: &str = "https://reddit.com";

/// Discussion provider backed by Reddit search.
pub struct RedditSource {
    client: reqwest::Client,
    config: RedditConfig,
}

impl RedditSource {
    /// Build a discussion provider with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the client cannot be constructed.
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self::with_client(build_client(config)?, config.reddit.clone()))
    }

    /// Build a discussion provider around an existing client.
    pub fn with_client(client: reqwest::Client, config: RedditConfig) -> Self {
        Self { client, config }
    }

    async fn search_once(&self, topic: &str, limit: usize) -> Result<Vec<ContentItem>, SourceError> {
        let url = endpoint(&self.config.api_url, "/search.json")?;
        let limit = limit.clamp(1, 100).to_string();
        let request = self.client.get(url).query(&[
            ("q", topic),
            ("limit", limit.as_str()),
            ("sort", self.config.sort.as_str()),
        ]);
        let body = get_json(request, "reddit").await?;
        parse_listing(&body)
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<ContentItem>, SourceError> {
        let attempts = self.config.attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.search_once(topic, limit).await {
                Ok(mut items) => {
                    items.truncate(limit);
                    return Ok(items);
                }
                Err(err) => {
                    tracing::warn!(attempt, attempts, error = %err, "reddit fetch failed");
                    last_err = Some(err);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| SourceError::Http("reddit: no attempts made".into())))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Reddit
    }
}

/// Map a Reddit listing body (`data.children[].data`) to discussion items.
///
/// `created_utc` (unix seconds) becomes an RFC 3339 `published` timestamp
/// and `permalink` becomes an absolute URL.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] if the body is not a listing.
pub fn parse_listing(body: &Value) -> Result<Vec<ContentItem>, SourceError> {
    let children = body
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("reddit: missing data.children array".into()))?;

    Ok(children
        .iter()
        .filter_map(|child| {
            let post = child.get("data")?;
            let title = str_field(post, "title")?;
            let url = str_field(post, "permalink")
                .map(|p| format!("{PERMALINK_BASE}{p}"))
                .or_else(|| str_field(post, "url"));
            let published = post
                .get("created_utc")
                .and_then(Value::as_f64)
                .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true));
            Some(ContentItem {
                title,
                url,
                description: str_field(post, "selftext"),
                published,
                kind: ItemKind::Reddit {
                    subreddit: str_field(post, "subreddit"),
                    upvotes: post.get("score").and_then(metric),
                    comments: post.get("num_comments").and_then(metric),
                },
                score: None,
            })
        })
        .collect())
}

fn metric(value: &Value) -> Option<Metric> {
    match value {
        Value::Number(n) => n.as_f64().map(Metric::Number),
        Value::String(s) => Some(Metric::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> Value {
        json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t3", "data": {
                        "title": "Rust 2024 edition is out",
                        "permalink": "/r/rust/comments/abc/rust_2024/",
                        "url": "https://blog.rust-lang.org",
                        "subreddit": "rust",
                        "score": 4200,
                        "num_comments": 321,
                        "created_utc": 1735689600.0,
                        "selftext": ""
                    }},
                    {"kind": "t3", "data": {"title": null, "permalink": "/r/x/"}}
                ]
            }
        })
    }

    #[test]
    fn listing_maps_to_discussion_items() {
        let items = parse_listing(&listing()).expect("parse");
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(
            item.url.as_deref(),
            Some("https://reddit.com/r/rust/comments/abc/rust_2024/")
        );
        assert_eq!(item.published.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert!(item.description.is_none());
        assert_eq!(
            item.kind,
            ItemKind::Reddit {
                subreddit: Some("rust".into()),
                upvotes: Some(Metric::Number(4200.0)),
                comments: Some(Metric::Number(321.0)),
            }
        );
    }

    #[test]
    fn non_listing_is_parse_error() {
        let err = parse_listing(&json!({"error": 429})).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn empty_listing_is_empty_vec() {
        let items = parse_listing(&json!({"data": {"children": []}})).expect("parse");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn unreachable_host_fails_after_all_attempts() {
        let config = RedditConfig {
            api_url: "http://127.0.0.1:9".into(),
            attempts: 2,
            retry_delay_ms: 1,
            ..Default::default()
        };
        let source = RedditSource::with_client(reqwest::Client::new(), config);
        let err = source.fetch("rust", 5).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }
}
