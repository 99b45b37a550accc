//! Turn orchestration: one user message in, one [`ResultEnvelope`] out.
//!
//! [`Orchestrator::handle`] runs the fixed turn pipeline:
//!
//! 1. "summarize that" style triggers summarize the last bot reply
//! 2. empty messages are rejected
//! 3. tone-change phrases switch the persona and reply in the new tone
//! 4. otherwise the message is classified, remembered, optionally refined,
//!    then routed to pagination, news, single-source or chat handling
//!
//! Provider failures never fail a turn: they are logged and treated as an
//! empty list. Only internal faults (poisoned session state) produce an
//! internal-error envelope.

use std::sync::{Arc, Mutex};

use aether_sources::{ContentItem, ItemKind, ProviderSet, SourceKind, SourcesConfig};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::briefing;
use crate::collaborators::{QueryRefiner, ReplyGenerator};
use crate::envelope::ResultEnvelope;
use crate::error::{AetherError, Result};
use crate::intent::{Intent, IntentRules, classify_with};
use crate::moderation::BLOCKED_REPLY;
use crate::persona::{ToneTable, display_name};
use crate::scoring;
use crate::session::{PAGE_STEP, Session};

/// Phrases that ask for a summary of the previous reply.
pub const SUMMARY_TRIGGERS: &[&str] = &[
    "summarize that",
    "summarize this",
    "summarize above",
    "summarize previous",
    "summarize the above",
    "summarise",
    "summary please",
];

/// Words that suppress the briefing card on a bare news turn.
pub const BRIEFING_SUPPRESSORS: &[&str] = &["reddit", "youtube", "yt", "video", "clip"];

/// Items returned per source on a fresh (non-pagination) turn.
pub const TOP_RESULTS: usize = 5;

/// Topic used when a "load more" request carries no text.
pub const DEFAULT_APPEND_TOPIC: &str = "latest";

pub const NOTHING_TO_SUMMARIZE: &str = "⚠️ I don’t have anything to summarize yet!";
pub const EMPTY_MESSAGE: &str = "⚠️ Please type something for me to respond to!";
pub const NO_PREVIOUS_TOPIC: &str = "⚠️ No previous topic to expand.";
pub const NO_NEWS: &str = "⚠️ No news found.";
pub const NO_REDDIT: &str = "⚠️ No Reddit posts found.";
pub const NO_YOUTUBE: &str = "⚠️ No YouTube videos found.";

/// Maximum items requested from each provider per fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub news: usize,
    pub reddit: usize,
    pub youtube: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            news: 30,
            reddit: 25,
            youtube: 25,
        }
    }
}

impl FetchLimits {
    pub fn from_config(config: &SourcesConfig) -> Self {
        Self {
            news: config.news.max_items,
            reddit: config.reddit.max_items,
            youtube: config.youtube.max_items,
        }
    }

    pub fn get(&self, kind: SourceKind) -> usize {
        match kind {
            SourceKind::News => self.news,
            SourceKind::Reddit => self.reddit,
            SourceKind::Youtube => self.youtube,
        }
    }
}

/// Routes classified turns to providers, the scorer, the briefing
/// summarizer and the reply generator.
pub struct Orchestrator {
    providers: ProviderSet,
    generator: Arc<dyn ReplyGenerator>,
    refiner: Arc<dyn QueryRefiner>,
    tones: ToneTable,
    rules: IntentRules,
    limits: FetchLimits,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("limits", &self.limits)
            .field("tones", &self.tones.tones.len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Orchestrator with the built-in tone and intent tables, default fetch
    /// limits and an entropy-seeded briefing shuffle.
    pub fn new(
        providers: ProviderSet,
        generator: Arc<dyn ReplyGenerator>,
        refiner: Arc<dyn QueryRefiner>,
    ) -> Self {
        Self {
            providers,
            generator,
            refiner,
            tones: ToneTable::default(),
            rules: IntentRules::default(),
            limits: FetchLimits::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_tones(mut self, tones: ToneTable) -> Self {
        self.tones = tones;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: IntentRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: FetchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Seed the briefing shuffle. `None` keeps entropy seeding.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        }
        self
    }

    /// Classify `message` with this orchestrator's rule table.
    pub fn classify(&self, message: &str) -> Intent {
        classify_with(&self.rules, message).0
    }

    /// Run one turn on `session`.
    ///
    /// `intent` and `tone` override classification and the session's
    /// active tone. Turns on the same session run one at a time.
    pub async fn handle(
        &self,
        session: &Session,
        intent: Option<Intent>,
        tone: Option<&str>,
        message: &str,
    ) -> ResultEnvelope {
        let _turn = session.begin_turn().await;
        match self.run_turn(session, intent, tone, message).await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(error = %err, "turn failed");
                ResultEnvelope::failure(format!("Internal error: {err}"))
            }
        }
    }

    /// Fetch one provider's unscored items for a "load more" request.
    /// A blank topic fetches [`DEFAULT_APPEND_TOPIC`].
    ///
    /// # Errors
    ///
    /// Returns [`AetherError::Source`] when the provider fails.
    pub async fn fetch_more(&self, kind: SourceKind, topic: &str) -> Result<Vec<ContentItem>> {
        let topic = match topic.trim() {
            "" => DEFAULT_APPEND_TOPIC,
            t => t,
        };
        let items = self
            .providers
            .get(kind)
            .fetch(topic, self.limits.get(kind))
            .await?;
        tracing::debug!(source = %kind, count = items.len(), "fetched more items");
        Ok(items)
    }

    async fn run_turn(
        &self,
        session: &Session,
        intent: Option<Intent>,
        tone: Option<&str>,
        message: &str,
    ) -> Result<ResultEnvelope> {
        let lower = message.trim().to_lowercase();

        if SUMMARY_TRIGGERS.iter().any(|t| lower.contains(t)) {
            let tone = self.resolve_tone(session, tone)?;
            return self.summarize_last(session, &tone).await;
        }

        if lower.is_empty() {
            return Ok(ResultEnvelope::failure(EMPTY_MESSAGE));
        }

        if let Some(new_tone) = self.tones.detect(message) {
            let new_tone = new_tone.to_owned();
            return self.switch_tone(session, &new_tone, message).await;
        }

        let intent = intent.unwrap_or_else(|| self.classify(message));
        let tone = self.resolve_tone(session, tone)?;
        tracing::info!(intent = %intent, tone = %tone, "handling turn");
        tracing::trace!(text = message, "turn message");

        if let Some(kind) = intent.source().filter(|_| intent.is_pagination()) {
            return self.paginate(session, kind).await;
        }

        session.remember_query(message.trim())?;

        let topic = if intent.is_news_family() {
            message.trim().to_owned()
        } else {
            self.refiner.refine(message).await
        };
        tracing::trace!(topic = %topic, "search topic");

        match intent {
            Intent::News | Intent::NewsOnly => {
                self.news_turn(session, intent, &topic, &lower, &tone).await
            }
            Intent::Reddit | Intent::RedditOnly => {
                Ok(self.single_source(SourceKind::Reddit, &topic).await)
            }
            Intent::Youtube | Intent::YoutubeOnly => {
                Ok(self.single_source(SourceKind::Youtube, &topic).await)
            }
            Intent::Chat | Intent::NewsMore | Intent::RedditMore | Intent::YoutubeMore => {
                let envelope = self.generator.generate_reply(Intent::Chat, &tone, message).await;
                self.record_reply(session, &envelope)?;
                Ok(envelope)
            }
        }
    }

    fn resolve_tone(&self, session: &Session, tone: Option<&str>) -> Result<String> {
        match tone.map(str::trim).filter(|t| !t.is_empty()) {
            Some(tone) => Ok(tone.to_owned()),
            None => session.active_tone(),
        }
    }

    async fn summarize_last(&self, session: &Session, tone: &str) -> Result<ResultEnvelope> {
        let last = session.last_bot_message()?;
        if last.trim().is_empty() {
            return Ok(ResultEnvelope::notice(NOTHING_TO_SUMMARIZE));
        }
        let prompt = format!("Summarize the following into 2 simple lines:\n\n{last}");
        let envelope = self.generator.generate_reply(Intent::Chat, tone, &prompt).await;
        self.record_reply(session, &envelope)?;
        Ok(envelope)
    }

    async fn switch_tone(
        &self,
        session: &Session,
        tone: &str,
        message: &str,
    ) -> Result<ResultEnvelope> {
        session.set_active_tone(tone)?;
        tracing::info!(tone, "tone switched");
        let ack = ContentItem::reply(format!(
            "🎭 Switched to {} mode, let's continue!",
            display_name(tone)
        ));

        let generated = self.generator.generate_reply(Intent::Chat, tone, message).await;
        if !generated.is_success() {
            return Ok(ResultEnvelope::success(vec![ack]));
        }
        self.record_reply(session, &generated)?;
        let mut results = Vec::with_capacity(1 + generated.results.len());
        results.push(ack);
        results.extend(generated.results);
        Ok(ResultEnvelope::success(results))
    }

    async fn paginate(&self, session: &Session, kind: SourceKind) -> Result<ResultEnvelope> {
        let Some(query) = session.last_query()? else {
            return Ok(ResultEnvelope::notice(NO_PREVIOUS_TOPIC));
        };
        let offset = session.advance_offset(kind)?;
        tracing::debug!(source = %kind, offset, "paginating");

        let page: Vec<ContentItem> = self
            .fetch_scored(kind, &query)
            .await
            .into_iter()
            .skip(offset)
            .take(PAGE_STEP)
            .collect();
        if page.is_empty() {
            return Ok(ResultEnvelope::notice(format!(
                "⚠️ No more {} for that topic.",
                kind.label()
            )));
        }
        Ok(ResultEnvelope::success(page))
    }

    async fn news_turn(
        &self,
        session: &Session,
        intent: Intent,
        topic: &str,
        lower: &str,
        tone: &str,
    ) -> Result<ResultEnvelope> {
        let news = top(self.fetch_scored(SourceKind::News, topic).await);
        if intent == Intent::NewsOnly {
            return Ok(non_empty_or(news, NO_NEWS));
        }

        let (reddit, youtube) = tokio::join!(
            self.fetch_scored(SourceKind::Reddit, topic),
            self.fetch_scored(SourceKind::Youtube, topic),
        );
        let (reddit, youtube) = (top(reddit), top(youtube));

        let mut results = Vec::with_capacity(1 + news.len() + reddit.len() + youtube.len());
        if !BRIEFING_SUPPRESSORS.iter().any(|w| lower.contains(w)) {
            let mut rng = self.child_rng()?;
            let mut card = briefing::summarize(
                &news,
                &reddit,
                &youtube,
                tone,
                topic,
                self.generator.as_ref(),
                &mut rng,
            )
            .await;
            card.kind = ItemKind::Briefing;
            if let Some(description) = card
                .description
                .as_deref()
                .filter(|d| *d != briefing::EMPTY_BRIEFING)
            {
                session.set_last_bot_message(description)?;
            }
            results.push(card);
        }
        results.extend(news);
        results.extend(reddit);
        results.extend(youtube);
        Ok(non_empty_or(results, NO_NEWS))
    }

    async fn single_source(&self, kind: SourceKind, topic: &str) -> ResultEnvelope {
        let items = top(self.fetch_scored(kind, topic).await);
        let empty_notice = match kind {
            SourceKind::News => NO_NEWS,
            SourceKind::Reddit => NO_REDDIT,
            SourceKind::Youtube => NO_YOUTUBE,
        };
        non_empty_or(items, empty_notice)
    }

    /// Fetch from `kind` and score against `topic`. Failures become an
    /// empty list.
    async fn fetch_scored(&self, kind: SourceKind, topic: &str) -> Vec<ContentItem> {
        let items = match self
            .providers
            .get(kind)
            .fetch(topic, self.limits.get(kind))
            .await
        {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(source = %kind, error = %err, "fetch failed, treating as empty");
                Vec::new()
            }
        };
        tracing::debug!(source = %kind, count = items.len(), "fetched");
        scoring::score(items, topic)
    }

    /// A per-turn RNG derived from the shared one, so no lock is held across
    /// the briefing's await.
    fn child_rng(&self) -> Result<StdRng> {
        let mut parent = self
            .rng
            .lock()
            .map_err(|_| AetherError::Session("briefing rng lock poisoned".into()))?;
        Ok(StdRng::seed_from_u64(parent.next_u64()))
    }

    /// Remember a generated reply for "summarize that". Failures and the
    /// moderation notice are not remembered.
    fn record_reply(&self, session: &Session, envelope: &ResultEnvelope) -> Result<()> {
        if envelope.is_success()
            && let Some(text) = envelope.reply_text()
            && text != BLOCKED_REPLY
        {
            session.set_last_bot_message(text)?;
        }
        Ok(())
    }
}

fn top(items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.into_iter().take(TOP_RESULTS).collect()
}

fn non_empty_or(items: Vec<ContentItem>, notice: &str) -> ResultEnvelope {
    if items.is_empty() {
        ResultEnvelope::notice(notice)
    } else {
        ResultEnvelope::success(items)
    }
}
