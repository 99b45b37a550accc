//! OpenAI-compatible chat-completions client.
//!
//! [`OpenAiClient`] implements both collaborator traits: conversational
//! replies, the briefing remark and search-phrase refinement all go through
//! one non-streaming `POST {base}/v1/chat/completions` call with different
//! prompts and sampling settings.
//!
//! User messages and model output both pass the keyword moderation gate.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::collaborators::{QueryRefiner, ReplyGenerator};
use crate::config::LlmConfig;
use crate::envelope::ResultEnvelope;
use crate::error::{AetherError, Result};
use crate::intent::Intent;
pub use crate::moderation::BLOCKED_REPLY;
use crate::moderation::is_disallowed;
use crate::persona::ToneTable;

/// Reply when no API key is configured.
pub const MISSING_KEY_REPLY: &str = "⚠️ Missing API key. Please check your .env file.";

/// Reply when the model cannot be reached or answers with nothing usable.
pub const UNAVAILABLE_REPLY: &str = "⚠️ I couldn't reach the language model. Please try again.";


const REFINE_SYSTEM_PROMPT: &str = "Rewrite the user input into a short, API-friendly search phrase.";
const REFINE_MAX_TOKENS: u32 = 25;
const REFINE_TEMPERATURE: f32 = 0.4;

const REFLECT_SYSTEM_PROMPT: &str = "Return exactly two lines. No bullets.";
const REFLECT_MAX_TOKENS: u32 = 45;
const REFLECT_TEMPERATURE: f32 = 0.7;

/// One chat message on the wire.
#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Non-streaming chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

/// Sampling settings for one call.
#[derive(Debug, Clone, Copy)]
struct CallSettings {
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

/// Chat-completions client for any OpenAI-compatible server.
pub struct OpenAiClient {
    config: LlmConfig,
    api_key: Option<String>,
    tones: ToneTable,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl OpenAiClient {
    /// Create a client from `config`, resolving the API key from the inline
    /// value or `config.api_key_env`.
    ///
    /// A missing key is not an error here: replies degrade to
    /// [`MISSING_KEY_REPLY`] and refinement returns its input.
    ///
    /// # Errors
    ///
    /// Returns [`AetherError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig, tones: ToneTable) -> Result<Self> {
        let api_key =
            aether_sources::config::resolve_key(config.api_key.as_deref(), &config.api_key_env)
                .ok();
        if api_key.is_none() {
            tracing::warn!(
                env = %config.api_key_env,
                "no API key for the language model, replies are disabled"
            );
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AetherError::Llm(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            config: config.clone(),
            api_key,
            tones,
            client,
        })
    }

    /// Replace the resolved API key.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        format!("{base}/v1/chat/completions")
    }

    fn reply_settings(&self) -> CallSettings {
        CallSettings {
            temperature: self.config.reply_temperature,
            max_tokens: self.config.reply_max_tokens,
            timeout: Duration::from_secs(self.config.reply_timeout_seconds),
        }
    }

    /// System prompt for a conversational reply.
    pub fn reply_system_prompt(&self, intent: Intent, tone: &str) -> String {
        format!(
            "{persona}\nCurrent persona tone: {tone}\nCurrent intent: {intent}\n\n\
             Respond naturally in 1-2 paragraphs.\n\n\
             Avoid disclaimers and system-style text.",
            persona = self.tones.render_persona_prompt(tone),
            intent = capitalize(intent.label()),
        )
    }

    /// Send one system + user exchange and return the trimmed answer.
    async fn complete(&self, system: &str, user: &str, settings: CallSettings) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AetherError::Llm(format!(
                "missing API key ({})",
                self.config.api_key_env
            )));
        };

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(settings.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AetherError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AetherError::Llm(format!("invalid response body: {e}")))?;
        parse_completion(&payload)
    }
}

/// Map an HTTP error status to an [`AetherError::Llm`].
fn map_http_error(status: reqwest::StatusCode, body: &str) -> AetherError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 => AetherError::Llm(format!("authentication failed: {message}")),
        429 => AetherError::Llm(format!("rate limited: {message}")),
        code => AetherError::Llm(format!("HTTP {code}: {message}")),
    }
}

/// Extract an error message from an OpenAI error response body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Pull `choices[0].message.content` out of a completion, trimmed.
///
/// # Errors
///
/// Returns [`AetherError::Llm`] when the content is missing or blank.
pub fn parse_completion(payload: &serde_json::Value) -> Result<String> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AetherError::Llm("completion had no content".into()))
}

/// `news_more` → `News_more`.
fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Strip wrapping quotes a model sometimes adds around a phrase.
fn strip_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim()
}

#[async_trait]
impl ReplyGenerator for OpenAiClient {
    async fn generate_reply(&self, intent: Intent, tone: &str, message: &str) -> ResultEnvelope {
        if is_disallowed(message) {
            tracing::info!(intent = %intent, "message blocked by moderation");
            return ResultEnvelope::notice(BLOCKED_REPLY);
        }
        if self.api_key.is_none() {
            return ResultEnvelope::failure(MISSING_KEY_REPLY);
        }

        let system = self.reply_system_prompt(intent, tone);
        let user = format!("User said: {message}\nRespond naturally in {tone} tone.");
        match self.complete(&system, &user, self.reply_settings()).await {
            Ok(reply) if is_disallowed(&reply) => {
                tracing::info!(intent = %intent, "reply blocked by moderation");
                ResultEnvelope::notice(BLOCKED_REPLY)
            }
            Ok(reply) => ResultEnvelope::notice(reply),
            Err(err) => {
                tracing::warn!(error = %err, intent = %intent, "reply generation failed");
                ResultEnvelope::failure(UNAVAILABLE_REPLY)
            }
        }
    }

    async fn reflect(&self, topic: &str) -> Result<String> {
        let user = format!(
            "Write a reflective two-line take about '{topic}'. No bullets. \
             No summary of headlines. Philosophical tone."
        );
        let settings = CallSettings {
            temperature: REFLECT_TEMPERATURE,
            max_tokens: REFLECT_MAX_TOKENS,
            timeout: Duration::from_secs(self.config.reflect_timeout_seconds),
        };
        let take = self.complete(REFLECT_SYSTEM_PROMPT, &user, settings).await?;
        if is_disallowed(&take) {
            return Err(AetherError::Llm("remark blocked by moderation".into()));
        }
        Ok(take)
    }
}

#[async_trait]
impl QueryRefiner for OpenAiClient {
    async fn refine(&self, raw: &str) -> String {
        if !self.config.refine_queries || self.api_key.is_none() {
            return raw.to_owned();
        }
        let user = format!("User query: '{raw}'\nReturn only the refined phrase.");
        let settings = CallSettings {
            temperature: REFINE_TEMPERATURE,
            max_tokens: REFINE_MAX_TOKENS,
            timeout: Duration::from_secs(self.config.refine_timeout_seconds),
        };
        match self.complete(REFINE_SYSTEM_PROMPT, &user, settings).await {
            Ok(refined) => {
                let refined = strip_quotes(&refined);
                if refined.is_empty() {
                    raw.to_owned()
                } else {
                    tracing::trace!(raw, refined, "refined query");
                    refined.to_owned()
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "query refinement failed, using raw input");
                raw.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    fn client() -> OpenAiClient {
        OpenAiClient::new(&LlmConfig::default(), ToneTable::default())
            .unwrap()
            .with_api_key(Some("sk-test".into()))
    }

    #[test]
    fn endpoint_tolerates_v1_suffix() {
        let mut c = client();
        c.config.base_url = "http://localhost:8080/v1/".into();
        assert_eq!(c.endpoint(), "http://localhost:8080/v1/chat/completions");
        c.config.base_url = "https://api.openai.com".into();
        assert_eq!(c.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn system_prompt_names_tone_and_intent() {
        let prompt = client().reply_system_prompt(Intent::NewsMore, "comic");
        assert!(prompt.starts_with("You are Aether, an AI and tech companion."));
        assert!(prompt.contains("Current persona tone: comic"));
        assert!(prompt.contains("Current intent: News_more"));
        assert!(prompt.ends_with("Avoid disclaimers and system-style text."));
    }

    #[test]
    fn parse_completion_extracts_trimmed_content() {
        let payload = json!({"choices": [{"message": {"role": "assistant", "content": "  hi  "}}]});
        assert_eq!(parse_completion(&payload).unwrap(), "hi");
    }

    #[test]
    fn parse_completion_rejects_blank_or_missing_content() {
        assert!(parse_completion(&json!({"choices": []})).is_err());
        assert!(
            parse_completion(&json!({"choices": [{"message": {"content": "   "}}]})).is_err()
        );
    }

    #[test]
    fn error_message_prefers_api_error_field() {
        assert_eq!(
            extract_error_message(r#"{"error": {"message": "bad key"}}"#),
            "bad key"
        );
        assert_eq!(extract_error_message("plain"), "plain");
        let err = map_http_error(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert!(err.to_string().contains("authentication failed"));
    }

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(strip_quotes("  \"rust async\" "), "rust async");
        assert_eq!(strip_quotes("'ai chips'"), "ai chips");
    }

    #[tokio::test]
    async fn missing_key_short_circuits() {
        let c = client().with_api_key(None);
        let envelope = c.generate_reply(Intent::Chat, "casual", "hello").await;
        assert!(!envelope.is_success());
        assert_eq!(envelope.reply_text(), Some(MISSING_KEY_REPLY));
        assert_eq!(c.refine("raw words").await, "raw words");
        assert!(c.reflect("ai").await.is_err());
    }

    #[tokio::test]
    async fn disallowed_input_never_reaches_the_model() {
        let mut c = client();
        // Unroutable address: any request would fail with UNAVAILABLE_REPLY.
        c.config.base_url = "http://127.0.0.1:9".into();
        let envelope = c.generate_reply(Intent::Chat, "casual", "they should die").await;
        assert!(envelope.is_success());
        assert_eq!(envelope.reply_text(), Some(BLOCKED_REPLY));
    }
}
