//! # aether-sources
//!
//! Content providers for Aether: news articles, videos and discussion
//! threads behind one [`ContentSource`] trait.
//!
//! ## Design
//!
//! - NewsAPI with GNews fallback, YouTube Data API v3, Reddit search
//! - Every provider maps its JSON into the shared [`ContentItem`] shape
//! - Pure `parse_*` functions per provider, unit-tested without a network
//! - Provider failures surface as [`SourceError`]; callers decide whether
//!   an error degrades to "no results"
//!
//! ## Security
//!
//! - API keys are read from the environment (or inline config) at fetch time
//! - Keys and query text never appear in error messages

pub mod config;
pub mod error;
pub mod http;
pub mod providers;
pub mod source;
pub mod types;

use std::sync::Arc;

pub use config::{NewsBackend, SourcesConfig};
pub use error::{Result, SourceError};
pub use providers::{NewsSource, RedditSource, YoutubeSource};
pub use source::ContentSource;
pub use types::{ContentItem, Engagement, ItemKind, Metric, SourceKind};

/// The three live providers, sharing one HTTP client.
pub struct ProviderSet {
    pub news: Arc<dyn ContentSource>,
    pub reddit: Arc<dyn ContentSource>,
    pub youtube: Arc<dyn ContentSource>,
}

impl ProviderSet {
    /// Look up the provider serving `kind`.
    pub fn get(&self, kind: SourceKind) -> &Arc<dyn ContentSource> {
        match kind {
            SourceKind::News => &self.news,
            SourceKind::Reddit => &self.reddit,
            SourceKind::Youtube => &self.youtube,
        }
    }
}

/// Build the live providers from `config`.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if `config` is invalid, or
/// [`SourceError::Http`] if the HTTP client cannot be built.
pub fn build_providers(config: &SourcesConfig) -> Result<ProviderSet> {
    config.validate()?;
    let client = http::build_client(config)?;
    Ok(ProviderSet {
        news: Arc::new(NewsSource::with_client(client.clone(), config.news.clone())),
        reddit: Arc::new(RedditSource::with_client(client.clone(), config.reddit.clone())),
        youtube: Arc::new(YoutubeSource::with_client(client, config.youtube.clone())),
    })
}
