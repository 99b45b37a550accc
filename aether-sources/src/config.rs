//! Provider configuration with sensible defaults.
//!
//! [`SourcesConfig`] controls endpoints, per-source item limits, timeouts
//! and where API keys come from. Keys are never stored in the config by
//! default; each provider names the environment variable it reads.

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Configuration for all content providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
    /// News provider settings.
    pub news: NewsConfig,
    /// Video provider settings.
    pub youtube: YoutubeConfig,
    /// Discussion provider settings.
    pub reddit: RedditConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: None,
            news: NewsConfig::default(),
            youtube: YoutubeConfig::default(),
            reddit: RedditConfig::default(),
        }
    }
}

/// News backends, tried in the configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsBackend {
    /// newsapi.org `/v2/everything`.
    NewsApi,
    /// gnews.io `/api/v4/search`.
    GNews,
}

impl NewsBackend {
    /// Returns the backend name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewsApi => "newsapi",
            Self::GNews => "gnews",
        }
    }
}

/// News provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Backends to try, first non-empty success wins.
    pub backends: Vec<NewsBackend>,
    /// Default number of articles per fetch.
    pub max_items: usize,
    /// Article language filter.
    pub language: String,
    /// NewsAPI base URL.
    pub newsapi_url: String,
    /// NewsAPI key (inline). Prefer `newsapi_key_env`.
    pub newsapi_key: Option<String>,
    /// Environment variable holding the NewsAPI key.
    pub newsapi_key_env: String,
    /// GNews base URL.
    pub gnews_url: String,
    /// GNews key (inline). Prefer `gnews_key_env`.
    pub gnews_key: Option<String>,
    /// Environment variable holding the GNews key.
    pub gnews_key_env: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            backends: vec![NewsBackend::NewsApi, NewsBackend::GNews],
            max_items: 30,
            language: "en".to_owned(),
            newsapi_url: "https://newsapi.org".to_owned(),
            newsapi_key: None,
            newsapi_key_env: "NEWSAPI_KEY".to_owned(),
            gnews_url: "https://gnews.io".to_owned(),
            gnews_key: None,
            gnews_key_env: "GNEWS_API_KEY".to_owned(),
        }
    }
}

/// Video provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Default number of videos per fetch (the API caps this at 50).
    pub max_items: usize,
    /// Google APIs base URL.
    pub api_url: String,
    /// API key (inline). Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Optional ISO 3166-1 region bias.
    pub region_code: Option<String>,
    /// Whether to issue the follow-up statistics request for view counts.
    pub fetch_statistics: bool,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            max_items: 25,
            api_url: "https://www.googleapis.com".to_owned(),
            api_key: None,
            api_key_env: "YOUTUBE_API_KEY".to_owned(),
            region_code: None,
            fetch_statistics: true,
        }
    }
}

/// Discussion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    /// Default number of threads per fetch (the API caps this at 100).
    pub max_items: usize,
    /// Reddit base URL.
    pub api_url: String,
    /// Listing sort order.
    pub sort: String,
    /// Attempts per fetch before giving up. Reddit throttles anonymous
    /// clients with sporadic 429s.
    pub attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            max_items: 25,
            api_url: "https://www.reddit.com".to_owned(),
            sort: "hot".to_owned(),
            attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl SourcesConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds` must be greater than 0
    /// - every `max_items` must be greater than 0
    /// - `youtube.max_items` must be at most 50, `reddit.max_items` at most 100
    /// - `news.backends` must not be empty
    /// - `reddit.attempts` must be at least 1
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.timeout_seconds == 0 {
            return Err(SourceError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.news.max_items == 0 {
            return Err(SourceError::Config(
                "news.max_items must be greater than 0".into(),
            ));
        }
        if self.news.backends.is_empty() {
            return Err(SourceError::Config(
                "at least one news backend must be enabled".into(),
            ));
        }
        if self.youtube.max_items == 0 || self.youtube.max_items > 50 {
            return Err(SourceError::Config(
                "youtube.max_items must be between 1 and 50".into(),
            ));
        }
        if self.reddit.max_items == 0 || self.reddit.max_items > 100 {
            return Err(SourceError::Config(
                "reddit.max_items must be between 1 and 100".into(),
            ));
        }
        if self.reddit.attempts == 0 {
            return Err(SourceError::Config(
                "reddit.attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve an API key: a non-empty inline value wins, then the named
/// environment variable.
///
/// # Errors
///
/// Returns [`SourceError::MissingCredential`] naming the variable when
/// neither is set.
pub fn resolve_key(inline: Option<&str>, env_var: &str) -> Result<String, SourceError> {
    if let Some(key) = inline.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_owned());
    }
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(SourceError::MissingCredential(env_var.to_owned())),
    }
}
