//! Keyword moderation gate.
//!
//! A plain phrase filter applied to user messages before they reach the
//! language model and to model output before it reaches the user. This is a
//! tripwire, not a policy engine.

/// Reply shown in place of a blocked message or answer.
pub const BLOCKED_REPLY: &str = "🚫 I can't respond to that.";

/// Lowercase phrases that block a message.
pub const DISALLOWED_PATTERNS: &[&str] = &[
    "kill them",
    "should die",
    "praise attack",
    "celebrate deaths",
    "wipe out",
    "execute",
    "genocide",
    "massacre",
    "deserve to die",
];

/// Returns true if `text` contains any disallowed phrase, case-insensitively.
pub fn is_disallowed(text: &str) -> bool {
    let lower = text.to_lowercase();
    DISALLOWED_PATTERNS.iter().any(|p| lower.contains(p))
}
