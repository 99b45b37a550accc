//! Scripted collaborators shared by unit and integration tests. Built only
//! for tests or with the `test-utils` feature.
//!
//! Nothing here touches the network: sources serve fixed item lists and the
//! generator answers with `[{tone}] reply`.

use std::sync::{Arc, Mutex};

use aether_sources::{ContentItem, ContentSource, ItemKind, Metric, SourceError, SourceKind};
use async_trait::async_trait;

use crate::collaborators::ReplyGenerator;
use crate::envelope::ResultEnvelope;
use crate::error::{AetherError, Result};
use crate::intent::Intent;
use crate::moderation::{BLOCKED_REPLY, is_disallowed};

/// Serves a fixed list and records every topic it was asked for.
#[derive(Debug)]
pub struct StaticSource {
    kind: SourceKind,
    items: Vec<ContentItem>,
    topics: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new(kind: SourceKind, items: Vec<ContentItem>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            items,
            topics: Mutex::new(Vec::new()),
        })
    }

    /// Topics fetched so far, in call order.
    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn fetch(&self, topic: &str, limit: usize) -> std::result::Result<Vec<ContentItem>, SourceError> {
        if let Ok(mut topics) = self.topics.lock() {
            topics.push(topic.to_owned());
        }
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }
}

/// Always fails with [`SourceError::Http`].
#[derive(Debug, Clone, Copy)]
pub struct FailingSource(pub SourceKind);

#[async_trait]
impl ContentSource for FailingSource {
    async fn fetch(&self, _topic: &str, _limit: usize) -> std::result::Result<Vec<ContentItem>, SourceError> {
        Err(SourceError::Http("connection refused".into()))
    }

    fn kind(&self) -> SourceKind {
        self.0
    }
}

/// One recorded `generate_reply` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyCall {
    pub intent: Intent,
    pub tone: String,
    pub message: String,
}

/// Replies with `[{tone}] reply` (or a failure envelope) and a fixed
/// two-line remark. Disallowed messages get [`BLOCKED_REPLY`].
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    fail: bool,
    calls: Mutex<Vec<ReplyCall>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose replies are error envelopes and whose remarks fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ReplyCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedGenerator {
    async fn generate_reply(&self, intent: Intent, tone: &str, message: &str) -> ResultEnvelope {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ReplyCall {
                intent,
                tone: tone.to_owned(),
                message: message.to_owned(),
            });
        }
        if self.fail {
            ResultEnvelope::failure("⚠️ model down")
        } else if is_disallowed(message) {
            ResultEnvelope::notice(BLOCKED_REPLY)
        } else {
            ResultEnvelope::notice(format!("[{tone}] reply"))
        }
    }

    async fn reflect(&self, _topic: &str) -> Result<String> {
        if self.fail {
            return Err(AetherError::Llm("model down".into()));
        }
        Ok("Line one.\nLine two.".into())
    }
}

pub fn news_item(title: &str) -> ContentItem {
    ContentItem::bare(title, ItemKind::News { author: None })
}

pub fn reddit_item(title: &str) -> ContentItem {
    ContentItem::bare(
        title,
        ItemKind::Reddit {
            subreddit: Some("technology".into()),
            upvotes: Some(Metric::Number(100.0)),
            comments: None,
        },
    )
}

pub fn video_item(title: &str) -> ContentItem {
    ContentItem::bare(
        title,
        ItemKind::Youtube {
            channel: None,
            views: Some(Metric::Number(5_000.0)),
        },
    )
}

/// `n` items titled `"{prefix} story number {i}"`.
pub fn numbered(make: fn(&str) -> ContentItem, prefix: &str, n: usize) -> Vec<ContentItem> {
    (0..n)
        .map(|i| make(&format!("{prefix} story number {i}")))
        .collect()
}
