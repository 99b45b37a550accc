//! Cross-source briefing card.
//!
//! Collapses the top news and video items into a short bulleted digest
//! followed by a two-line reflective remark ("Aether's Take"). Discussion
//! threads are accepted but not pooled.

use aether_sources::{ContentItem, ItemKind, SourceKind};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::collaborators::ReplyGenerator;

/// Title of every briefing card.
pub const BRIEFING_TITLE: &str = "Aether's Briefing";

/// Description used when no item has a usable title.
pub const EMPTY_BRIEFING: &str = "No relevant posts found.";

/// Remark used when the generator is unavailable or returns nothing.
pub const FALLBACK_TAKE: &str = "AI evolves quickly, but meaning evolves slowly.\n\
What we choose to build defines us more than the tech itself.";

/// Headlines kept after shuffling.
pub const MAX_HEADLINES: usize = 5;

/// Titles shorter than this (in characters, after trimming) are noise.
const MIN_TITLE_CHARS: usize = 5;

/// A pooled headline with its source tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub source: SourceKind,
}

impl Headline {
    fn tag(&self) -> &'static str {
        match self.source {
            SourceKind::News => "(NEWS)",
            SourceKind::Youtube => "(YouTube)",
            SourceKind::Reddit => "(Reddit)",
        }
    }

    /// Bullet line: `• {title} {tag}`.
    pub fn bullet(&self) -> String {
        format!("• {} {}", self.title, self.tag())
    }
}

/// Pool usable titles from `news` then `video`, drop case-insensitive
/// duplicates (first occurrence wins), shuffle with `rng` and keep at most
/// [`MAX_HEADLINES`].
pub fn select_headlines<R: Rng + ?Sized>(
    news: &[ContentItem],
    video: &[ContentItem],
    rng: &mut R,
) -> Vec<Headline> {
    let pooled = news
        .iter()
        .map(|item| (item, SourceKind::News))
        .chain(video.iter().map(|item| (item, SourceKind::Youtube)));

    let mut seen = std::collections::HashSet::new();
    let mut headlines: Vec<Headline> = pooled
        .filter_map(|(item, source)| {
            let title = item.title.trim();
            if title.chars().count() < MIN_TITLE_CHARS {
                return None;
            }
            seen.insert(title.to_lowercase()).then(|| Headline {
                title: title.to_owned(),
                source,
            })
        })
        .collect();

    headlines.shuffle(rng);
    headlines.truncate(MAX_HEADLINES);
    headlines
}

/// Keep the first two non-blank lines of a generated remark, padding a
/// single line with an empty second line. `None` when nothing is left.
pub fn clean_take(raw: &str) -> Option<String> {
    let mut lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(2)
        .collect();
    match lines.len() {
        0 => None,
        1 => {
            lines.push("");
            Some(lines.join("\n"))
        }
        _ => Some(lines.join("\n")),
    }
}

/// Build the card from selected headlines and a cleaned remark.
///
/// An empty headline list yields the "No relevant posts found." card and
/// ignores `take`.
pub fn compose_card(headlines: &[Headline], take: &str) -> ContentItem {
    let description = if headlines.is_empty() {
        EMPTY_BRIEFING.to_owned()
    } else {
        let bullets: Vec<String> = headlines.iter().map(Headline::bullet).collect();
        format!(
            "**{BRIEFING_TITLE}**\n\n{}\n\n✨ **Aether's Take:**\n{take}",
            bullets.join("\n")
        )
        .trim()
        .to_owned()
    };
    let mut card = ContentItem::bare(BRIEFING_TITLE, ItemKind::Summary);
    card.description = Some(description);
    card
}

/// Summarize the top items of a news turn into one card.
///
/// The remark comes from `generator`; any failure or empty answer falls
/// back to [`FALLBACK_TAKE`]. The generator is not consulted when there
/// are no headlines.
pub async fn summarize<R: Rng + Send + ?Sized>(
    news: &[ContentItem],
    discussion: &[ContentItem],
    video: &[ContentItem],
    tone: &str,
    topic: &str,
    generator: &dyn ReplyGenerator,
    rng: &mut R,
) -> ContentItem {
    let headlines = select_headlines(news, video, rng);
    tracing::debug!(
        tone,
        news = news.len(),
        discussion = discussion.len(),
        video = video.len(),
        headlines = headlines.len(),
        "assembling briefing"
    );
    if headlines.is_empty() {
        return compose_card(&headlines, "");
    }

    let take = match generator.reflect(topic).await {
        Ok(raw) => clean_take(&raw).unwrap_or_else(|| FALLBACK_TAKE.to_owned()),
        Err(err) => {
            tracing::warn!(error = %err, "briefing remark failed, using fallback");
            FALLBACK_TAKE.to_owned()
        }
    };
    compose_card(&headlines, &take)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::envelope::ResultEnvelope;
    use crate::error::{AetherError, Result};
    use crate::intent::Intent;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedRemark {
        remark: Option<String>,
        calls: AtomicUsize,
    }

    impl ScriptedRemark {
        fn ok(text: &str) -> Self {
            Self {
                remark: Some(text.to_owned()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                remark: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReplyGenerator for ScriptedRemark {
        async fn generate_reply(&self, _: Intent, _: &str, _: &str) -> ResultEnvelope {
            ResultEnvelope::notice("unused")
        }

        async fn reflect(&self, _topic: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.remark
                .clone()
                .ok_or_else(|| AetherError::Llm("upstream down".into()))
        }
    }

    fn news(title: &str) -> ContentItem {
        ContentItem::bare(title, ItemKind::News { author: None })
    }

    fn video(title: &str) -> ContentItem {
        ContentItem::bare(
            title,
            ItemKind::Youtube {
                channel: None,
                views: None,
            },
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn short_titles_and_duplicates_are_dropped() {
        let headlines = select_headlines(
            &[news("  AI chips  "), news("tiny"), news("ai CHIPS")],
            &[video("AI Chips"), video("Robots dance")],
            &mut rng(),
        );
        let mut titles: Vec<&str> = headlines.iter().map(|h| h.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, ["AI chips", "Robots dance"]);
    }

    #[test]
    fn at_most_five_headlines() {
        let many: Vec<ContentItem> = (0..8).map(|i| news(&format!("headline {i}"))).collect();
        let headlines = select_headlines(&many, &[], &mut rng());
        assert_eq!(headlines.len(), MAX_HEADLINES);
    }

    #[test]
    fn same_seed_same_selection() {
        let many: Vec<ContentItem> = (0..8).map(|i| news(&format!("headline {i}"))).collect();
        let a = select_headlines(&many, &[], &mut StdRng::seed_from_u64(42));
        let b = select_headlines(&many, &[], &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_reorder_the_digest() {
        let many: Vec<ContentItem> = (0..10).map(|i| news(&format!("headline {i}"))).collect();
        let selections: std::collections::HashSet<Vec<String>> = (0..8)
            .map(|seed| {
                select_headlines(&many, &[], &mut StdRng::seed_from_u64(seed))
                    .into_iter()
                    .map(|h| h.title)
                    .collect()
            })
            .collect();
        assert!(selections.len() > 1);
    }

    #[test]
    fn bullets_carry_source_tags() {
        let h = Headline {
            title: "Quantum leap".into(),
            source: SourceKind::Youtube,
        };
        assert_eq!(h.bullet(), "• Quantum leap (YouTube)");
    }

    #[test]
    fn take_cleaning() {
        assert_eq!(clean_take("one\n\n two \nthree").as_deref(), Some("one\ntwo"));
        assert_eq!(clean_take("  only line ").as_deref(), Some("only line\n"));
        assert_eq!(clean_take(" \n "), None);
    }

    #[tokio::test]
    async fn empty_pool_gives_no_posts_card_without_calling_generator() {
        let generator = ScriptedRemark::ok("unused");
        let card = summarize(
            &[news("tiny")],
            &[news("thread title here")],
            &[],
            "casual",
            "ai",
            &generator,
            &mut rng(),
        )
        .await;
        assert_eq!(card.title, BRIEFING_TITLE);
        assert_eq!(card.source_type(), "summary");
        assert_eq!(card.description.as_deref(), Some(EMPTY_BRIEFING));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn card_layout_with_generated_take() {
        let generator = ScriptedRemark::ok("Line one.\nLine two.\nLine three.");
        let card = summarize(
            &[news("Chips get faster")],
            &[],
            &[],
            "casual",
            "ai chips",
            &generator,
            &mut rng(),
        )
        .await;
        assert_eq!(
            card.description.as_deref(),
            Some(
                "**Aether's Briefing**\n\n• Chips get faster (NEWS)\n\n✨ **Aether's Take:**\nLine one.\nLine two."
            )
        );
    }

    #[tokio::test]
    async fn generator_failure_uses_fallback_take() {
        let generator = ScriptedRemark::failing();
        let card = summarize(
            &[news("Chips get faster")],
            &[],
            &[video("Robots dance")],
            "casual",
            "ai",
            &generator,
            &mut rng(),
        )
        .await;
        let description = card.description.unwrap();
        assert!(description.ends_with(FALLBACK_TAKE));
        assert!(description.contains("(NEWS)"));
        assert!(description.contains("(YouTube)"));
    }

    #[tokio::test]
    async fn discussion_threads_are_not_pooled() {
        let generator = ScriptedRemark::ok("a\nb");
        let card = summarize(
            &[],
            &[news("A discussion thread title")],
            &[],
            "casual",
            "ai",
            &generator,
            &mut rng(),
        )
        .await;
        assert_eq!(card.description.as_deref(), Some(EMPTY_BRIEFING));
    }
}
