//! Error types for the aether-sources crate.
//!
//! All errors use stable string messages suitable for logs. No API keys
//! or query text appear in error messages.

/// Errors that can occur while fetching from a content provider.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// An HTTP request to a provider failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid provider configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A required API key is not set.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Every configured backend for a source failed.
    #[error("all backends failed: {0}")]
    AllBackendsFailed(String),
}

/// Convenience type alias for aether-sources results.
pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http() {
        let err = SourceError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_parse() {
        let err = SourceError::Parse("missing articles array".into());
        assert_eq!(err.to_string(), "parse error: missing articles array");
    }

    #[test]
    fn display_config() {
        let err = SourceError::Config("news.max_items must be > 0".into());
        assert_eq!(err.to_string(), "config error: news.max_items must be > 0");
    }

    #[test]
    fn display_missing_credential() {
        let err = SourceError::MissingCredential("NEWSAPI_KEY".into());
        assert_eq!(err.to_string(), "missing credential: NEWSAPI_KEY");
    }

    #[test]
    fn display_all_backends_failed() {
        let err = SourceError::AllBackendsFailed("newsapi: timeout; gnews: 429".into());
        assert_eq!(
            err.to_string(),
            "all backends failed: newsapi: timeout; gnews: 429"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceError>();
    }
}
