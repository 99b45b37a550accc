//! Keyword-driven intent classifier.
//!
//! Maps a raw user message to one of ten [`Intent`] labels. Classification
//! is a pure function of the message and an [`IntentRules`] table, applied
//! in a fixed precedence order where the first matching rule wins:
//!
//! 1. Empty message → [`Intent::Chat`]
//! 2. A "more" marker plus a source keyword → `{source}_more`
//! 3. An "only"/"just" marker plus a source keyword → `{source}_only`
//! 4. Source heuristics (news, media browsing, discussion), never for questions
//! 5. Broader fallback keyword rules, some of which accept questions
//! 6. Explanatory phrasing → [`Intent::Chat`]
//! 7. Default → [`Intent::Chat`]
//!
//! All matching is case-insensitive substring containment.

use std::fmt;
use std::str::FromStr;

use aether_sources::SourceKind;
use serde::{Deserialize, Serialize};

/// What the user wants from a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Chat,
    News,
    NewsOnly,
    NewsMore,
    Reddit,
    RedditOnly,
    RedditMore,
    Youtube,
    YoutubeOnly,
    YoutubeMore,
}

impl Intent {
    /// Wire label (`news_only`, `youtube_more`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::News => "news",
            Self::NewsOnly => "news_only",
            Self::NewsMore => "news_more",
            Self::Reddit => "reddit",
            Self::RedditOnly => "reddit_only",
            Self::RedditMore => "reddit_more",
            Self::Youtube => "youtube",
            Self::YoutubeOnly => "youtube_only",
            Self::YoutubeMore => "youtube_more",
        }
    }

    /// The content source this intent targets, `None` for chat.
    pub fn source(&self) -> Option<SourceKind> {
        match self {
            Self::Chat => None,
            Self::News | Self::NewsOnly | Self::NewsMore => Some(SourceKind::News),
            Self::Reddit | Self::RedditOnly | Self::RedditMore => Some(SourceKind::Reddit),
            Self::Youtube | Self::YoutubeOnly | Self::YoutubeMore => Some(SourceKind::Youtube),
        }
    }

    /// True for the three `*_more` pagination intents.
    pub fn is_pagination(&self) -> bool {
        matches!(self, Self::NewsMore | Self::RedditMore | Self::YoutubeMore)
    }

    /// True for the news family (`news`, `news_only`, `news_more`).
    pub fn is_news_family(&self) -> bool {
        self.source() == Some(SourceKind::News)
    }

    fn more(source: SourceKind) -> Self {
        match source {
            SourceKind::News => Self::NewsMore,
            SourceKind::Reddit => Self::RedditMore,
            SourceKind::Youtube => Self::YoutubeMore,
        }
    }

    fn only(source: SourceKind) -> Self {
        match source {
            SourceKind::News => Self::NewsOnly,
            SourceKind::Reddit => Self::RedditOnly,
            SourceKind::Youtube => Self::YoutubeOnly,
        }
    }

    fn plain(source: SourceKind) -> Self {
        match source {
            SourceKind::News => Self::News,
            SourceKind::Reddit => Self::Reddit,
            SourceKind::Youtube => Self::Youtube,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Intent; 10] = [
            Intent::Chat,
            Intent::News,
            Intent::NewsOnly,
            Intent::NewsMore,
            Intent::Reddit,
            Intent::RedditOnly,
            Intent::RedditMore,
            Intent::Youtube,
            Intent::YoutubeOnly,
            Intent::YoutubeMore,
        ];
        let wanted = s.trim().to_lowercase();
        ALL.into_iter()
            .find(|intent| intent.label() == wanted)
            .ok_or_else(|| format!("unknown intent label: {s}"))
    }
}

/// Which precedence step produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedRule {
    Empty,
    More,
    Only,
    Heuristic,
    Fallback,
    Explanatory,
    Default,
}

/// A source keyword rule: if any keyword occurs in the message, the rule
/// selects `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub source: SourceKind,
    pub keywords: Vec<String>,
    /// Whether the rule may fire for messages that look like questions.
    #[serde(default = "default_true")]
    pub allow_questions: bool,
}

fn default_true() -> bool {
    true
}

impl KeywordRule {
    fn new(source: SourceKind, keywords: &[&str], allow_questions: bool) -> Self {
        Self {
            source,
            keywords: owned(keywords),
            allow_questions,
        }
    }

    fn matches(&self, msg: &str, is_question: bool) -> bool {
        (self.allow_questions || !is_question) && contains_any(msg, &self.keywords)
    }
}

/// Ordered keyword tables driving [`classify_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentRules {
    /// A message starting with one of these plus a space is a question.
    pub question_words: Vec<String>,
    /// Future-tense phrases that also mark a question.
    pub future_phrases: Vec<String>,
    /// Markers that turn a source keyword into a pagination request.
    pub more_markers: Vec<String>,
    pub more_rules: Vec<KeywordRule>,
    /// Markers that restrict a request to a single source.
    pub only_markers: Vec<String>,
    pub only_rules: Vec<KeywordRule>,
    /// Fetch heuristics, tried in order. Built-ins never accept questions.
    pub heuristics: Vec<KeywordRule>,
    /// Broader checks tried after the heuristics.
    pub fallbacks: Vec<KeywordRule>,
    /// Explanatory or definitional phrasing that is always conversation.
    pub explanatory_phrases: Vec<String>,
}

const BROWSE_PHRASES: &[&str] = &[
    "show me", "latest", "recent", "play", "watch", "videos", "channel", "list", "find",
    "search", "give me",
];
const VIDEO_KEYWORDS: &[&str] = &["youtube", "video", "yt", "clip", "upload", "vlog", "interview"];
const REDDIT_KEYWORDS: &[&str] = &["reddit", "thread", "discussion", "upvotes", "r/"];
const NEWS_KEYWORDS: &[&str] = &["news", "headline", "article", "story", "update"];

impl Default for IntentRules {
    fn default() -> Self {
        let browse: Vec<&str> = BROWSE_PHRASES.iter().chain(VIDEO_KEYWORDS).copied().collect();
        Self {
            question_words: owned(&[
                "when", "where", "who", "what", "why", "how", "which", "whom", "whose",
            ]),
            future_phrases: owned(&["when will ", "will ", "is going to ", "when does ", "when did "]),
            more_markers: owned(&["more"]),
            more_rules: vec![
                KeywordRule::new(SourceKind::Youtube, &["youtube", "video", "yt"], true),
                KeywordRule::new(SourceKind::Reddit, &["reddit"], true),
                KeywordRule::new(SourceKind::News, &["news", "article"], true),
            ],
            only_markers: owned(&["only", "just"]),
            only_rules: vec![
                KeywordRule::new(SourceKind::News, &["news", "article", "headline"], true),
                KeywordRule::new(SourceKind::Reddit, &["reddit", "thread", "discussion"], true),
                KeywordRule::new(SourceKind::Youtube, &["youtube", "yt", "video", "clip"], true),
            ],
            heuristics: vec![
                KeywordRule::new(SourceKind::News, NEWS_KEYWORDS, false),
                KeywordRule::new(SourceKind::Youtube, &browse, false),
                KeywordRule::new(SourceKind::Reddit, REDDIT_KEYWORDS, false),
            ],
            fallbacks: vec![
                KeywordRule::new(SourceKind::Reddit, &["reddit", "discussion", "thread"], true),
                // A question that mentions news is conversation, not a fetch.
                KeywordRule::new(SourceKind::News, &["news", "headline", "update", "story"], false),
                KeywordRule::new(
                    SourceKind::Youtube,
                    &["youtube", "video", "yt", "clip", "watch", "interview"],
                    true,
                ),
            ],
            explanatory_phrases: owned(&[
                "explain", "what is", "tell me about", "define", "who is", "when will", "will",
            ]),
        }
    }
}

impl IntentRules {
    /// True if `message` reads as a question: contains `?`, starts with a
    /// question word followed by a space, or contains a future-tense phrase.
    pub fn looks_like_question(&self, message: &str) -> bool {
        let m = message.trim().to_lowercase();
        if m.contains('?') {
            return true;
        }
        if self
            .question_words
            .iter()
            .any(|w| m.strip_prefix(w.as_str()).is_some_and(|rest| rest.starts_with(' ')))
        {
            return true;
        }
        contains_any(&m, &self.future_phrases)
    }
}

/// Classify `message` with the built-in rules.
pub fn classify(message: &str) -> Intent {
    classify_with(&IntentRules::default(), message).0
}

/// Classify `message` with `rules`, also reporting which step matched.
pub fn classify_with(rules: &IntentRules, message: &str) -> (Intent, MatchedRule) {
    let msg = message.trim().to_lowercase();
    if msg.is_empty() {
        return (Intent::Chat, MatchedRule::Empty);
    }

    if contains_any(&msg, &rules.more_markers)
        && let Some(rule) = rules.more_rules.iter().find(|r| contains_any(&msg, &r.keywords))
    {
        return (Intent::more(rule.source), MatchedRule::More);
    }

    if contains_any(&msg, &rules.only_markers)
        && let Some(rule) = rules.only_rules.iter().find(|r| contains_any(&msg, &r.keywords))
    {
        return (Intent::only(rule.source), MatchedRule::Only);
    }

    let is_question = rules.looks_like_question(&msg);

    if let Some(rule) = rules.heuristics.iter().find(|r| r.matches(&msg, is_question)) {
        return (Intent::plain(rule.source), MatchedRule::Heuristic);
    }

    if let Some(rule) = rules.fallbacks.iter().find(|r| r.matches(&msg, is_question)) {
        return (Intent::plain(rule.source), MatchedRule::Fallback);
    }

    if contains_any(&msg, &rules.explanatory_phrases) {
        return (Intent::Chat, MatchedRule::Explanatory);
    }

    (Intent::Chat, MatchedRule::Default)
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}
