//! News articles from NewsAPI, falling back to GNews.
//!
//! Backends are tried in the configured order. The first backend that
//! answers with at least one article wins; a backend that fails is logged
//! and skipped.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{resolve_key, NewsBackend, NewsConfig, SourcesConfig};
use crate::error::SourceError;
use crate::http::{build_client, get_json};
use crate::source::ContentSource;
use crate::types::{ContentItem, ItemKind, SourceKind};

use super::{endpoint, str_field};

/// Placeholder title NewsAPI uses for articles pulled by the publisher.
const REMOVED_TITLE: &str = "[Removed]";

/// News provider backed by NewsAPI and GNews.
pub struct NewsSource {
    client: reqwest::Client,
    config: NewsConfig,
}

impl NewsSource {
    /// Build a news provider with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the client cannot be constructed.
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self::with_client(build_client(config)?, config.news.clone()))
    }

    /// Build a news provider around an existing client.
    pub fn with_client(client: reqwest::Client, config: NewsConfig) -> Self {
        Self { client, config }
    }

    async fn query_backend(
        &self,
        backend: NewsBackend,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, SourceError> {
        let page_size = limit.clamp(1, 100).to_string();
        match backend {
            NewsBackend::NewsApi => {
                let key = resolve_key(
                    self.config.newsapi_key.as_deref(),
                    &self.config.newsapi_key_env,
                )?;
                let url = endpoint(&self.config.newsapi_url, "/v2/everything")?;
                let request = self
                    .client
                    .get(url)
                    .header("X-Api-Key", key)
                    .query(&[
                        ("q", topic),
                        ("language", self.config.language.as_str()),
                        ("pageSize", page_size.as_str()),
                    ]);
                let body = get_json(request, backend.name()).await?;
                parse_newsapi(&body)
            }
            NewsBackend::GNews => {
                let key =
                    resolve_key(self.config.gnews_key.as_deref(), &self.config.gnews_key_env)?;
                let url = endpoint(&self.config.gnews_url, "/api/v4/search")?;
                let request = self.client.get(url).query(&[
                    ("q", topic),
                    ("lang", self.config.language.as_str()),
                    ("max", page_size.as_str()),
                    ("apikey", key.as_str()),
                ]);
                let body = get_json(request, backend.name()).await?;
                parse_gnews(&body)
            }
        }
    }
}

#[async_trait]
impl ContentSource for NewsSource {
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<ContentItem>, SourceError> {
        let mut errors: Vec<String> = Vec::new();
        let mut answered = false;

        for &backend in &self.config.backends {
            match self.query_backend(backend, topic, limit).await {
                Ok(mut items) if !items.is_empty() => {
                    tracing::debug!(backend = backend.name(), count = items.len(), "news backend returned articles");
                    items.truncate(limit);
                    return Ok(items);
                }
                Ok(_) => {
                    tracing::debug!(backend = backend.name(), "news backend returned no articles");
                    answered = true;
                }
                Err(err) => {
                    tracing::warn!(backend = backend.name(), error = %err, "news backend failed");
                    errors.push(format!("{}: {err}", backend.name()));
                }
            }
        }

        if answered || errors.is_empty() {
            Ok(Vec::new())
        } else {
            Err(SourceError::AllBackendsFailed(errors.join("; ")))
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::News
    }
}

/// Map a NewsAPI `/v2/everything` body to news items.
///
/// Articles without a title, or withdrawn ones, are skipped.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] if the body reports an error status or
/// has no `articles` array.
pub fn parse_newsapi(body: &Value) -> Result<Vec<ContentItem>, SourceError> {
    if body.get("status").and_then(Value::as_str) == Some("error") {
        let message = str_field(body, "message").unwrap_or_else(|| "unknown error".to_owned());
        return Err(SourceError::Parse(format!("newsapi: {message}")));
    }
    let articles = body
        .get("articles")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("newsapi: missing articles array".into()))?;

    Ok(articles
        .iter()
        .filter_map(|article| {
            let author = str_field(article, "author")
                .or_else(|| article.get("source").and_then(|s| str_field(s, "name")));
            article_item(article, author)
        })
        .collect())
}

/// Map a GNews `/api/v4/search` body to news items.
///
/// GNews has no author field, so the publisher name stands in for it.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] if the body carries `errors` or has no
/// `articles` array.
pub fn parse_gnews(body: &Value) -> Result<Vec<ContentItem>, SourceError> {
    if let Some(errors) = body.get("errors") {
        return Err(SourceError::Parse(format!("gnews: {errors}")));
    }
    let articles = body
        .get("articles")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("gnews: missing articles array".into()))?;

    Ok(articles
        .iter()
        .filter_map(|article| {
            let author = article.get("source").and_then(|s| str_field(s, "name"));
            article_item(article, author)
        })
        .collect())
}

fn article_item(article: &Value, author: Option<String>) -> Option<ContentItem> {
    let title = str_field(article, "title").filter(|t| t != REMOVED_TITLE)?;
    Some(ContentItem {
        title,
        url: str_field(article, "url"),
        description: str_field(article, "description"),
        published: str_field(article, "publishedAt"),
        kind: ItemKind::News { author },
        score: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn newsapi_articles_map_to_news_items() {
        let body = json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": null, "name": "Wired"},
                    "author": "Ada Lovelace",
                    "title": "New chips announced",
                    "description": "A faster accelerator",
                    "url": "https://wired.example/chips",
                    "publishedAt": "2025-03-01T10:00:00Z"
                },
                {
                    "source": {"id": null, "name": "Verge"},
                    "author": null,
                    "title": "Robots everywhere",
                    "description": null,
                    "url": "https://verge.example/robots",
                    "publishedAt": "2025-03-02T10:00:00Z"
                }
            ]
        });
        let items = parse_newsapi(&body).expect("parse");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "New chips announced");
        assert_eq!(
            items[0].kind,
            ItemKind::News {
                author: Some("Ada Lovelace".into())
            }
        );
        assert_eq!(items[0].published.as_deref(), Some("2025-03-01T10:00:00Z"));
        // Missing author falls back to the publisher.
        assert_eq!(
            items[1].kind,
            ItemKind::News {
                author: Some("Verge".into())
            }
        );
        assert!(items[1].description.is_none());
    }

    #[test]
    fn newsapi_skips_removed_and_untitled_articles() {
        let body = json!({
            "status": "ok",
            "articles": [
                {"title": "[Removed]", "url": "https://removed.com"},
                {"title": null, "url": "https://x.example"},
                {"title": "Kept", "url": "https://kept.example"}
            ]
        });
        let items = parse_newsapi(&body).expect("parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Kept");
    }

    #[test]
    fn newsapi_error_status_is_parse_error() {
        let body = json!({"status": "error", "code": "rateLimited", "message": "Too many requests"});
        let err = parse_newsapi(&body).unwrap_err();
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn newsapi_missing_articles_is_parse_error() {
        let err = parse_newsapi(&json!({"status": "ok"})).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn gnews_articles_use_publisher_as_author() {
        let body = json!({
            "totalArticles": 1,
            "articles": [{
                "title": "Quantum leap",
                "description": "Qubits galore",
                "url": "https://gnews.example/q",
                "publishedAt": "2025-02-01T08:00:00Z",
                "source": {"name": "Nature", "url": "https://nature.com"}
            }]
        });
        let items = parse_gnews(&body).expect("parse");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].kind,
            ItemKind::News {
                author: Some("Nature".into())
            }
        );
    }

    #[test]
    fn gnews_errors_field_is_parse_error() {
        let err = parse_gnews(&json!({"errors": ["API key invalid"]})).unwrap_err();
        assert!(err.to_string().contains("API key invalid"));
    }

    #[tokio::test]
    async fn fetch_without_any_keys_reports_all_backends_failed() {
        let config = NewsConfig {
            newsapi_key_env: "AETHER_TEST_NO_NEWSAPI_KEY".into(),
            gnews_key_env: "AETHER_TEST_NO_GNEWS_KEY".into(),
            ..Default::default()
        };
        let source = NewsSource::with_client(reqwest::Client::new(), config);
        let err = source.fetch("ai", 5).await.unwrap_err();
        assert!(matches!(err, SourceError::AllBackendsFailed(_)));
        assert!(err.to_string().contains("AETHER_TEST_NO_NEWSAPI_KEY"));
        assert!(err.to_string().contains("AETHER_TEST_NO_GNEWS_KEY"));
    }

    #[test]
    fn kind_is_news() {
        let source = NewsSource::with_client(reqwest::Client::new(), NewsConfig::default());
        assert_eq!(source.kind(), SourceKind::News);
    }
}
