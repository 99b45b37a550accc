//! Traits for the language-model collaborators the orchestrator depends on.
//!
//! The orchestrator never talks to a model directly. Replies, query
//! rewriting and the briefing remark all go through these traits so tests
//! can substitute scripted fakes and deployments can swap providers.

use async_trait::async_trait;

use crate::envelope::ResultEnvelope;
use crate::error::Result;
use crate::intent::Intent;

/// Generates conversational text.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Produce a reply to `message` in `tone`.
    ///
    /// Never fails: upstream problems come back as an error envelope with a
    /// single warning item.
    async fn generate_reply(&self, intent: Intent, tone: &str, message: &str) -> ResultEnvelope;

    /// A short reflective remark about `topic`, ideally two lines.
    async fn reflect(&self, topic: &str) -> Result<String>;
}

/// Rewrites free text into a compact search phrase.
#[async_trait]
pub trait QueryRefiner: Send + Sync {
    /// Returns the refined phrase, or `raw` unchanged when refinement is
    /// unavailable.
    async fn refine(&self, raw: &str) -> String;
}

/// A refiner that returns its input trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRefiner;

#[async_trait]
impl QueryRefiner for PassthroughRefiner {
    async fn refine(&self, raw: &str) -> String {
        raw.trim().to_owned()
    }
}
