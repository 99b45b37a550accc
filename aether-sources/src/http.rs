//! Shared HTTP client with User-Agent rotation for provider requests.
//!
//! Reddit rejects requests without a descriptive User-Agent, and the other
//! APIs are indifferent, so every provider shares one configured client.

use crate::config::SourcesConfig;
use crate::error::SourceError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// User-Agent strings, one picked per client.
const USER_AGENTS: &[&str] = &[
    "aether/0.1 (conversational news companion)",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 aether/0.1",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 aether/0.1",
];

/// Build a [`reqwest::Client`] configured for provider API calls.
///
/// The client has:
/// - Timeout from config
/// - Random User-Agent from the rotation list (or custom if configured)
/// - gzip decompression
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SourcesConfig) -> Result<reqwest::Client, SourceError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SourceError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Send a prepared request and decode a JSON body, mapping transport
/// failures and non-success statuses to [`SourceError::Http`] and decode
/// failures to [`SourceError::Parse`].
pub(crate) async fn get_json(
    request: reqwest::RequestBuilder,
    backend: &str,
) -> Result<serde_json::Value, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::Http(format!("{backend}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Http(format!(
            "{backend}: unexpected status {}",
            status.as_u16()
        )));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| SourceError::Parse(format!("{backend}: invalid JSON body: {e}")))
}
