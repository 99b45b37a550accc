//! Error types for the aether conversation layer.

use aether_sources::SourceError;

/// Top-level error type for the conversation layer.
#[derive(Debug, thiserror::Error)]
pub enum AetherError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Chat-completions request or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Session state could not be read or updated.
    #[error("session error: {0}")]
    Session(String),

    /// HTTP transport error.
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Content provider error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AetherError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            AetherError::Config("bad port".into()).to_string(),
            "config error: bad port"
        );
        assert_eq!(
            AetherError::Llm("empty choices".into()).to_string(),
            "LLM error: empty choices"
        );
        assert_eq!(
            AetherError::Session("lock poisoned".into()).to_string(),
            "session error: lock poisoned"
        );
        assert_eq!(
            AetherError::Server("bind failed".into()).to_string(),
            "server error: bind failed"
        );
    }

    #[test]
    fn source_errors_convert() {
        let err: AetherError = SourceError::MissingCredential("NEWSAPI_KEY".into()).into();
        assert_eq!(
            err.to_string(),
            "source error: missing credential: NEWSAPI_KEY"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: AetherError = std::io::Error::other("disk gone").into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
