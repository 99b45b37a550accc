//! Core types for content items and provider identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single content item, as returned by a provider or synthesised by the
/// conversation layer.
///
/// The shared base fields live on the struct; variant payloads live on
/// [`ItemKind`], which is flattened so the JSON form carries a plain
/// `source_type` tag next to the base fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Display text.
    pub title: String,
    /// Link to the original content. Absent on synthetic reply items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Longer body text (news description, briefing body).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Publication timestamp as reported by the provider (ISO-8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Variant tag and source-specific payload.
    #[serde(flatten)]
    pub kind: ItemKind,
    /// Blended relevance score attached by the scorer. Never persisted.
    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Variant payload of a [`ContentItem`], tagged by `source_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum ItemKind {
    /// A news article.
    News {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author: Option<String>,
    },
    /// A video.
    Youtube {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        views: Option<Metric>,
    },
    /// A discussion thread.
    Reddit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subreddit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upvotes: Option<Metric>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comments: Option<Metric>,
    },
    /// A conversational reply or user-facing warning.
    AetherReply,
    /// A cross-source briefing card.
    Briefing,
    /// A summary card as produced by the briefing summarizer.
    Summary,
}

/// Engagement signal carried by an item, dispatched on its variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Engagement {
    /// Video view count (may be unparsable, hence `None`).
    Views(Option<f64>),
    /// Discussion upvotes (may be unparsable, hence `None`).
    Upvotes(Option<f64>),
    /// No engagement signal at all.
    Absent,
}

/// A provider-reported count.
///
/// Providers disagree on whether counts are numbers or strings (YouTube
/// returns `"1234"`, scraped sources return `"1,234"`), so both are kept
/// verbatim and parsed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Number(f64),
    Text(String),
}

impl Metric {
    /// Numeric value, stripping thousands separators from strings.
    ///
    /// Strings that are not plain digits after removing commas yield `None`.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(raw) => {
                let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                digits.parse::<f64>().ok()
            }
        }
    }
}

impl From<u64> for Metric {
    fn from(n: u64) -> Self {
        Self::Number(n as f64)
    }
}

impl ContentItem {
    /// Build a synthetic reply item carrying user-facing text.
    pub fn reply(title: impl Into<String>) -> Self {
        Self::bare(title, ItemKind::AetherReply)
    }

    /// Build an item with only a title and a kind; every other field empty.
    pub fn bare(title: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            title: title.into(),
            url: None,
            description: None,
            published: None,
            kind,
            score: None,
        }
    }

    /// Wire name of this item's variant (`news`, `youtube`, ...).
    pub fn source_type(&self) -> &'static str {
        self.kind.source_type()
    }

    /// Engagement signal for scoring.
    ///
    /// A video without a `views` field, or a thread without `upvotes`,
    /// reports [`Engagement::Absent`] and is scored like a news item.
    pub fn engagement(&self) -> Engagement {
        match &self.kind {
            ItemKind::Youtube {
                views: Some(views), ..
            } => Engagement::Views(views.value()),
            ItemKind::Reddit {
                upvotes: Some(upvotes),
                ..
            } => Engagement::Upvotes(upvotes.value()),
            _ => Engagement::Absent,
        }
    }
}

impl ItemKind {
    /// Wire name of this variant.
    pub fn source_type(&self) -> &'static str {
        match self {
            Self::News { .. } => "news",
            Self::Youtube { .. } => "youtube",
            Self::Reddit { .. } => "reddit",
            Self::AetherReply => "aether_reply",
            Self::Briefing => "briefing",
            Self::Summary => "summary",
        }
    }
}

/// Content providers the conversation layer can fetch from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// News articles (NewsAPI, GNews).
    News,
    /// Discussion threads (Reddit).
    Reddit,
    /// Videos (YouTube).
    Youtube,
}

impl SourceKind {
    /// Returns the wire name of this source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Reddit => "reddit",
            Self::Youtube => "youtube",
        }
    }

    /// Returns a human-readable label for user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Reddit => "Reddit posts",
            Self::Youtube => "YouTube videos",
        }
    }

    /// Returns all source variants.
    pub fn all() -> &'static [SourceKind] {
        &[Self::News, Self::Reddit, Self::Youtube]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn news_item_serializes_with_source_type_tag() {
        let item = ContentItem {
            title: "Chips".into(),
            url: Some("https://example.com/chips".into()),
            description: Some("A story about chips".into()),
            published: Some("2025-01-01T00:00:00Z".into()),
            kind: ItemKind::News {
                author: Some("Ada".into()),
            },
            score: None,
        };
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["source_type"], "news");
        assert_eq!(value["author"], "Ada");
        assert_eq!(value["title"], "Chips");
        assert!(value.get("_score").is_none());
    }

    #[test]
    fn reply_item_has_no_url() {
        let value = serde_json::to_value(ContentItem::reply("hi")).expect("serialize");
        assert_eq!(value, json!({"title": "hi", "source_type": "aether_reply"}));
    }

    #[test]
    fn video_item_deserializes_string_views() {
        let item: ContentItem = serde_json::from_value(json!({
            "source_type": "youtube",
            "title": "Launch",
            "channel": "Space",
            "views": "1,250,000",
            "url": "https://youtube.com/watch?v=1"
        }))
        .expect("deserialize");
        assert_eq!(item.source_type(), "youtube");
        assert_eq!(item.engagement(), Engagement::Views(Some(1_250_000.0)));
    }

    #[test]
    fn discussion_item_deserializes_numeric_upvotes() {
        let item: ContentItem = serde_json::from_value(json!({
            "source_type": "reddit",
            "title": "Thread",
            "subreddit": "rust",
            "upvotes": 420,
            "comments": 12
        }))
        .expect("deserialize");
        assert_eq!(item.engagement(), Engagement::Upvotes(Some(420.0)));
    }

    #[test]
    fn score_round_trips_under_underscore_name() {
        let mut item = ContentItem::reply("x");
        item.score = Some(0.5);
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["_score"], 0.5);
    }

    #[test]
    fn missing_engagement_is_absent() {
        let video = ContentItem::bare(
            "clip",
            ItemKind::Youtube {
                channel: None,
                views: None,
            },
        );
        assert_eq!(video.engagement(), Engagement::Absent);
        let news = ContentItem::bare("n", ItemKind::News { author: None });
        assert_eq!(news.engagement(), Engagement::Absent);
    }

    #[test]
    fn metric_parses_thousands_separators() {
        assert_eq!(Metric::Text("12,345".into()).value(), Some(12_345.0));
        assert_eq!(Metric::Text(" 7 ".into()).value(), Some(7.0));
        assert_eq!(Metric::Number(3.0).value(), Some(3.0));
    }

    #[test]
    fn metric_rejects_non_numeric_text() {
        assert_eq!(Metric::Text("1.2k".into()).value(), None);
        assert_eq!(Metric::Text("".into()).value(), None);
        assert_eq!(Metric::Text("-5".into()).value(), None);
    }

    #[test]
    fn source_kind_display() {
        assert_eq!(SourceKind::News.to_string(), "news");
        assert_eq!(SourceKind::Reddit.to_string(), "reddit");
        assert_eq!(SourceKind::Youtube.to_string(), "youtube");
        assert_eq!(SourceKind::all().len(), 3);
    }
}
