//! Videos from the YouTube Data API v3.
//!
//! A `search` call finds videos for the topic; an optional follow-up
//! `videos?part=statistics` call attaches view counts so the scorer has an
//! engagement signal. A failed statistics call only costs the view counts.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{resolve_key, SourcesConfig, YoutubeConfig};
use crate::error::SourceError;
use crate::http::{build_client, get_json};
use crate::source::ContentSource;
use crate::types::{ContentItem, ItemKind, Metric, SourceKind};

use super::{endpoint, str_field};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Video provider backed by the YouTube Data API.
pub struct YoutubeSource {
    client: reqwest::Client,
    config: YoutubeConfig,
}

impl YoutubeSource {
    /// Build a video provider with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the client cannot be constructed.
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self::with_client(build_client(config)?, config.youtube.clone()))
    }

    /// Build a video provider around an existing client.
    pub fn with_client(client: reqwest::Client, config: YoutubeConfig) -> Self {
        Self { client, config }
    }

    async fn view_counts(
        &self,
        key: &str,
        ids: &[String],
    ) -> Result<HashMap<String, Metric>, SourceError> {
        let url = endpoint(&self.config.api_url, "/youtube/v3/videos")?;
        let joined = ids.join(",");
        let request = self.client.get(url).query(&[
            ("part", "statistics"),
            ("id", joined.as_str()),
            ("key", key),
        ]);
        let body = get_json(request, "youtube statistics").await?;
        parse_statistics(&body)
    }
}

#[async_trait]
impl ContentSource for YoutubeSource {
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<ContentItem>, SourceError> {
        let key = resolve_key(self.config.api_key.as_deref(), &self.config.api_key_env)?;
        let url = endpoint(&self.config.api_url, "/youtube/v3/search")?;
        let max_results = limit.clamp(1, 50).to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("part", "snippet"),
            ("q", topic),
            ("type", "video"),
            ("order", "relevance"),
            ("maxResults", max_results.as_str()),
            ("key", key.as_str()),
        ];
        if let Some(region) = self.config.region_code.as_deref() {
            params.push(("regionCode", region));
        }

        let body = get_json(self.client.get(url).query(&params), "youtube search").await?;
        let mut videos = parse_search(&body)?;
        videos.truncate(limit);

        if self.config.fetch_statistics && !videos.is_empty() {
            let ids: Vec<String> = videos.iter().map(|(id, _)| id.clone()).collect();
            match self.view_counts(&key, &ids).await {
                Ok(counts) => {
                    for (id, item) in &mut videos {
                        if let ItemKind::Youtube { views, .. } = &mut item.kind {
                            *views = counts.get(id.as_str()).cloned();
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "youtube statistics lookup failed, continuing without views");
                }
            }
        }

        Ok(videos.into_iter().map(|(_, item)| item).collect())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Youtube
    }
}

/// Map a `search?part=snippet` body to `(video id, item)` pairs.
///
/// Results that are not videos (channels, playlists) are skipped.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] if the body carries an API error or has
/// no `items` array.
pub fn parse_search(body: &Value) -> Result<Vec<(String, ContentItem)>, SourceError> {
    check_api_error(body)?;
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("youtube: missing items array".into()))?;

    Ok(items
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(|id| str_field(id, "videoId"))?;
            let snippet = entry.get("snippet")?;
            let title = str_field(snippet, "title")?;
            let item = ContentItem {
                title,
                url: Some(format!("{WATCH_URL}{id}")),
                description: str_field(snippet, "description"),
                published: str_field(snippet, "publishedAt"),
                kind: ItemKind::Youtube {
                    channel: str_field(snippet, "channelTitle"),
                    views: None,
                },
                score: None,
            };
            Some((id, item))
        })
        .collect())
}

/// Map a `videos?part=statistics` body to view counts by video id.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] if the body carries an API error or has
/// no `items` array.
pub fn parse_statistics(body: &Value) -> Result<HashMap<String, Metric>, SourceError> {
    check_api_error(body)?;
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("youtube statistics: missing items array".into()))?;

    Ok(items
        .iter()
        .filter_map(|entry| {
            let id = str_field(entry, "id")?;
            let views = entry
                .get("statistics")
                .and_then(|s| str_field(s, "viewCount"))?;
            Some((id, Metric::Text(views)))
        })
        .collect())
}

fn check_api_error(body: &Value) -> Result<(), SourceError> {
    match body.get("error") {
        Some(error) => {
            let message = str_field(error, "message").unwrap_or_else(|| error.to_string());
            Err(SourceError::Parse(format!("youtube: {message}")))
        }
        None => Ok(()),
    }
}
