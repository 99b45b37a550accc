//! The uniform response shape returned for every conversational turn.

use aether_sources::ContentItem;
use serde::{Deserialize, Serialize};

/// Outcome of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// `{status, results, resume}` as sent to the caller.
///
/// `results` is always present, possibly empty. `resume` is only true for
/// typewriter continuations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub status: Status,
    pub results: Vec<ContentItem>,
    #[serde(default)]
    pub resume: bool,
}

impl ResultEnvelope {
    /// A successful envelope carrying `results`.
    pub fn success(results: Vec<ContentItem>) -> Self {
        Self {
            status: Status::Success,
            results,
            resume: false,
        }
    }

    /// A failed envelope carrying `results`.
    pub fn error(results: Vec<ContentItem>) -> Self {
        Self {
            status: Status::Error,
            results,
            resume: false,
        }
    }

    /// A successful envelope with a single conversational notice.
    pub fn notice(text: impl Into<String>) -> Self {
        Self::success(vec![ContentItem::reply(text)])
    }

    /// A failed envelope with a single conversational notice.
    pub fn failure(text: impl Into<String>) -> Self {
        Self::error(vec![ContentItem::reply(text)])
    }

    /// Mark this envelope as a typewriter continuation.
    #[must_use]
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Text of the first reply item, if any.
    pub fn reply_text(&self) -> Option<&str> {
        self.results
            .iter()
            .find(|item| item.source_type() == "aether_reply")
            .map(|item| item.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    #[test]
    fn notice_serializes_to_wire_shape() {
        let value = serde_json::to_value(ResultEnvelope::notice("⚠️ No news found.")).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "results": [{"source_type": "aether_reply", "title": "⚠️ No news found."}],
                "resume": false
            })
        );
    }

    #[test]
    fn failure_has_error_status() {
        let env = ResultEnvelope::failure("boom");
        assert!(!env.is_success());
        assert_eq!(env.reply_text(), Some("boom"));
    }

    #[test]
    fn empty_results_still_serialized() {
        let value = serde_json::to_value(ResultEnvelope::success(Vec::new())).unwrap();
        assert_eq!(value["results"], json!([]));
    }

    #[test]
    fn resume_flag_round_trips() {
        let env = ResultEnvelope::notice("rest of text").with_resume(true);
        let back: ResultEnvelope =
            serde_json::from_str(&serde_json::to_string(&env).unwrap()).unwrap();
        assert!(back.resume);
        assert_eq!(back, env);
    }
}
