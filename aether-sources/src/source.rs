//! Trait definition for pluggable content providers.
//!
//! Each provider (news, video, discussion) implements [`ContentSource`] to
//! give the conversation layer one way to fetch items for a topic.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{ContentItem, SourceKind};

/// A pluggable content provider.
///
/// Implementors own their HTTP client and configuration. Each one handles:
///
/// - URL construction with query encoding
/// - API key lookup
/// - Mapping the provider's JSON into [`ContentItem`] values
///
/// Implementations must be `Send + Sync` so the conversation layer can hold
/// them as `Arc<dyn ContentSource>` and fetch from several concurrently.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `limit` items about `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if credentials are missing, the request
    /// fails or the response cannot be parsed. Callers treat an error the
    /// same as an empty result.
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<ContentItem>, SourceError>;

    /// Returns which [`SourceKind`] this provider serves.
    fn kind(&self) -> SourceKind;
}
