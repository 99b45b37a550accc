//! Content provider implementations.
//!
//! Each module provides a struct implementing [`crate::source::ContentSource`]
//! for one provider family, plus pure functions that map the provider's JSON
//! into [`crate::types::ContentItem`] values.

pub mod news;
pub mod reddit;
pub mod youtube;

pub use news::NewsSource;
pub use reddit::RedditSource;
pub use youtube::YoutubeSource;

use url::Url;

use crate::error::SourceError;

/// Join `path` onto a configured base URL, tolerating a trailing slash.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url, SourceError> {
    let base = Url::parse(base.trim_end_matches('/'))
        .map_err(|e| SourceError::Config(format!("invalid base URL {base:?}: {e}")))?;
    base.join(path)
        .map_err(|e| SourceError::Config(format!("invalid endpoint path {path:?}: {e}")))
}

/// Read a string field, treating JSON null and blank strings as absent.
pub(crate) fn str_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_joins_with_and_without_trailing_slash() {
        let a = endpoint("https://newsapi.org", "/v2/everything").expect("url");
        let b = endpoint("https://newsapi.org/", "/v2/everything").expect("url");
        assert_eq!(a.as_str(), "https://newsapi.org/v2/everything");
        assert_eq!(a, b);
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        let err = endpoint("not a url", "/x").unwrap_err();
        assert!(matches!(err, SourceError::Config(_)));
    }

    #[test]
    fn str_field_skips_null_and_blank() {
        let v = json!({"a": "x", "b": null, "c": "  "});
        assert_eq!(str_field(&v, "a").as_deref(), Some("x"));
        assert_eq!(str_field(&v, "b"), None);
        assert_eq!(str_field(&v, "c"), None);
        assert_eq!(str_field(&v, "missing"), None);
    }
}
