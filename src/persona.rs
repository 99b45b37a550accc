//! Persona tones for Aether's replies.
//!
//! A tone is a short label (`casual`, `dark_humor`, ...) with two roles:
//!
//! 1. **Detection**: free-text phrases like "be funny" or "talk nerdy" switch
//!    the session's tone (see [`ToneTable::detect`]).
//! 2. **Rendering**: each label maps to a style directive that is appended to
//!    [`PERSONA_PREAMBLE`] to form the reply generator's persona prompt.
//!
//! The table is ordered; the first tone with a matching trigger wins. Tones
//! without a directive of their own render with the neutral directive.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Tone every new session starts in.
pub const DEFAULT_TONE: &str = "casual";

/// Fixed opening of every persona prompt.
pub const PERSONA_PREAMBLE: &str = "You are Aether, an AI and tech companion.";

const NEUTRAL_DIRECTIVE: &str = "Maintain a balanced, objective and informative tone. \
Avoid strong emotion. Keep answers clear, direct and grounded.";

static BUILTIN: LazyLock<ToneTable> = LazyLock::new(ToneTable::default);

/// One selectable tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneRule {
    pub label: String,
    /// Lowercase phrases that switch to this tone when found in a message.
    pub triggers: Vec<String>,
    /// Style directive for the reply generator. `None` renders as neutral.
    #[serde(default)]
    pub directive: Option<String>,
}

/// Ordered tone table plus the neutral fallback directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneTable {
    pub tones: Vec<ToneRule>,
    pub neutral_directive: String,
}

fn rule(label: &str, triggers: &[&str], directive: Option<&str>) -> ToneRule {
    ToneRule {
        label: label.to_owned(),
        triggers: triggers.iter().map(|t| (*t).to_owned()).collect(),
        directive: directive.map(str::to_owned),
    }
}

impl Default for ToneTable {
    fn default() -> Self {
        let tones = vec![
            rule(
                "casual",
                &["casual", "friendly", "chill", "talk normally", "normal tone", "simple tone", "relaxed", "easy going"],
                Some("Speak like a friendly human chatting normally. Use simple language, \
                      contractions, emojis, relatable phrasing and easygoing conversation."),
            ),
            rule(
                "professional",
                &["professional", "formal", "business", "official", "corporate", "proper", "structured"],
                Some("Speak in a crisp, structured and polished tone. Use clear explanations \
                      and formal vocabulary, avoid slang, and sound like an expert addressing \
                      a professional audience."),
            ),
            rule(
                "comic",
                &[
                    "comic", "funny", "humorous", "funniest", "make me laugh", "be funny", "joke",
                    "crack me up", "fun way", "make it hilarious", "hilarious", "tell in a funny way",
                    "comedy mode", "joke mode", "funny tone",
                ],
                Some("Be funny, witty and playful. Use jokes, exaggeration, relatable humor and \
                      clever analogies. Keep the energy light and entertaining."),
            ),
            rule(
                "empathetic",
                &[
                    "empathetic", "kind", "understanding", "soft tone", "be gentle", "emotional",
                    "supportive", "comfort me", "be nice", "be sweet",
                ],
                Some("Be warm, kind and emotionally understanding. Use gentle, supportive \
                      language, acknowledge feelings and speak with compassion."),
            ),
            rule(
                "creative",
                &[
                    "creative", "artistic", "imaginative", "fantasy", "poetic", "story mode",
                    "describe beautifully", "use metaphors", "expressive",
                ],
                Some("Be expressive, imaginative and vivid. Use metaphors, storytelling and \
                      colorful imagery so the explanation feels artistic."),
            ),
            rule(
                "analytical",
                &[
                    "analytical", "logical", "rational", "explain logically", "break it down",
                    "deep analysis", "technical explanation",
                ],
                None,
            ),
            rule(
                "professor",
                &[
                    "professor", "teacher", "academic", "phd", "explain like teacher",
                    "explain like professor", "university style", "lecture mode", "educational tone",
                ],
                Some("Speak like an experienced Indian professor: clear, slightly formal, wise \
                      and structured. Use relatable examples and gentle wit, and favor depth \
                      without being strict."),
            ),
            rule(
                "confident",
                &["confident", "assertive", "bold", "strong tone", "dominating", "commanding"],
                None,
            ),
            rule(
                "sarcastic",
                &["sarcastic", "sarcasm", "be sarcastic", "dry humor", "mocking", "deadpan tone"],
                Some("Use dry humor, ironic remarks and a slightly teasing tone. Keep it \
                      playful, not hurtful."),
            ),
            rule(
                "roast",
                &[
                    "roast", "roast me", "insult me", "destroy me", "burn me", "funny insult",
                    "clown me", "light roast",
                ],
                Some("Give playful, savage but harmless insults. Be witty and confident, and \
                      never cross into cruelty."),
            ),
            rule(
                "genz",
                &[
                    "genz", "gen z", "sigma", "skibidi", "rizz", "npc talk", "tiktok style",
                    "zoomery", "slay", "w rizz", "based", "gyatt", "ohio", "fanum tax",
                ],
                Some("Speak in chaotic Gen-Z internet style with memes, slang, dramatic \
                      reactions and expressive humor, while staying helpful."),
            ),
            rule(
                "dark_humor",
                &["dark humor", "dark-humor", "dark jokes", "edgy joke", "twisted humor"],
                Some("Use light, edgy humor that stays safe. Mildly twisted jokes are fine; \
                      real violence and sensitive topics are not."),
            ),
            rule(
                "cold",
                &["cold", "emotionless", "robotic", "heartless", "neutral tone", "detached", "dead inside"],
                Some("Speak in an emotionless, robotic, analytical tone. Short, precise and \
                      logical, like a machine giving information."),
            ),
            rule(
                "wholesome",
                &["wholesome", "comforting", "kind-hearted", "soft", "warm tone", "encouraging", "pure tone"],
                Some("Be uplifting, soft and encouraging. Leave the reader feeling a little \
                      better than before."),
            ),
            rule(
                "bollywood",
                &["bollywood", "dramatic", "filmy", "over dramatic", "dramatic way", "movie style"],
                Some("Speak in dramatic, emotional, filmy Bollywood style with expressive \
                      lines, dramatic metaphors and high-energy storytelling."),
            ),
            rule(
                "ultra_nerd",
                &[
                    "ultra nerd", "scientific", "hyper technical", "nerd", "nerdy", "be a nerd",
                    "geek", "geeky", "nerdy way", "talk nerdy", "nerd mode", "geek mode",
                    "super nerd", "full nerd", "math lover", "space lover", "astrophysics",
                    "coding nerd", "explain like a scientist", "go geek mode", "tech nerd",
                    "engineer tone", "scientific tone",
                ],
                Some("Speak like an enthusiastic, hyper-passionate nerd. Use technical language \
                      from programming, physics, math, AI, gaming and sci-fi, make geeky \
                      references and add small bursts of nerdy humor and fun facts."),
            ),
            rule(
                "shakespeare",
                &["shakespeare", "bard", "old english", "elizabethan", "thee thou", "poetic old style"],
                Some("Speak in old-English Shakespearean style with poetic, rhythmic lines, \
                      thee-thou phrasing and literary charm."),
            ),
        ];
        Self {
            tones,
            neutral_directive: NEUTRAL_DIRECTIVE.to_owned(),
        }
    }
}

impl ToneTable {
    /// The built-in table, shared.
    pub fn builtin() -> &'static ToneTable {
        &BUILTIN
    }

    /// Returns the first tone whose trigger occurs in `message`.
    ///
    /// Matching is case-insensitive substring containment; earlier table
    /// entries win over later ones.
    pub fn detect(&self, message: &str) -> Option<&str> {
        let msg = message.trim().to_lowercase();
        if msg.is_empty() {
            return None;
        }
        self.tones
            .iter()
            .find(|tone| tone.triggers.iter().any(|t| msg.contains(t.as_str())))
            .map(|tone| tone.label.as_str())
    }

    /// Style directive for `label`, or the neutral directive when the label
    /// is unknown or has none.
    pub fn directive(&self, label: &str) -> &str {
        self.tones
            .iter()
            .find(|tone| tone.label == label)
            .and_then(|tone| tone.directive.as_deref())
            .unwrap_or(&self.neutral_directive)
    }

    /// Persona prompt for `label`: the preamble followed by its directive.
    pub fn render_persona_prompt(&self, label: &str) -> String {
        format!("{PERSONA_PREAMBLE} {}", self.directive(label))
    }
}

/// Detect a tone switch in `message` using the built-in table.
pub fn detect_tone_change(message: &str) -> Option<String> {
    ToneTable::builtin().detect(message).map(str::to_owned)
}

/// Render the persona prompt for `tone` using the built-in table.
pub fn render_persona_prompt(tone: &str) -> String {
    ToneTable::builtin().render_persona_prompt(tone)
}

/// Human-readable tone name: `dark_humor` → `Dark Humor`.
pub fn display_name(label: &str) -> String {
    label
        .split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
