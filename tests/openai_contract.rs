//! OpenAI Client Contract Tests
//!
//! These tests verify exact HTTP API format compliance for the
//! chat-completions client: request bodies, headers, response parsing and
//! how upstream failures map onto envelopes and fallbacks.

use aether::collaborators::{QueryRefiner, ReplyGenerator};
use aether::config::LlmConfig;
use aether::envelope::Status;
use aether::intent::Intent;
use aether::llm::{BLOCKED_REPLY, OpenAiClient, UNAVAILABLE_REPLY};
use aether::persona::ToneTable;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    let config = LlmConfig {
        base_url: server.uri(),
        api_key: Some("test-api-key-123".into()),
        ..LlmConfig::default()
    };
    OpenAiClient::new(&config, ToneTable::default()).expect("client")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1234567890,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Request Format Validation Tests
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reply_request_format() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key-123"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.8,
            "max_tokens": 600,
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "User said: tell me a story\nRespond naturally in comic tone."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Once upon a time.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let envelope = client
        .generate_reply(Intent::Chat, "comic", "tell me a story")
        .await;

    assert_eq!(envelope.status, Status::Success);
    assert_eq!(envelope.reply_text(), Some("Once upon a time."));
}

#[tokio::test]
async fn test_refine_request_format() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "temperature": 0.4,
            "max_tokens": 25,
            "messages": [
                {"role": "system", "content": "Rewrite the user input into a short, API-friendly search phrase."},
                {"role": "user", "content": "User query: 'what are people saying about rust'\nReturn only the refined phrase."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("\"rust programming\"")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let refined = client.refine("what are people saying about rust").await;
    assert_eq!(refined, "rust programming");
}

#[tokio::test]
async fn test_reflect_request_format() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "temperature": 0.7,
            "max_tokens": 45,
            "messages": [
                {"role": "system", "content": "Return exactly two lines. No bullets."},
                {"role": "user", "content": "Write a reflective two-line take about 'ai chips'. No bullets. No summary of headlines. Philosophical tone."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Silicon dreams.\nHuman choices.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let take = client.reflect("ai chips").await.expect("remark");
    assert_eq!(take, "Silicon dreams.\nHuman choices.");
}

// ────────────────────────────────────────────────────────────────────────────
// Error Handling Tests
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_becomes_error_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "overloaded", "type": "server_error"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let envelope = client.generate_reply(Intent::Chat, "casual", "hello").await;
    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.reply_text(), Some(UNAVAILABLE_REPLY));
}

#[tokio::test]
async fn test_rate_limit_fails_reflect_and_refine_falls_back() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit exceeded"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.reflect("ai").await.expect_err("rate limited");
    assert!(err.to_string().contains("rate limited"));
    assert_eq!(client.refine("raw words").await, "raw words");
}

#[tokio::test]
async fn test_empty_choices_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let envelope = client.generate_reply(Intent::Chat, "casual", "hello").await;
    assert_eq!(envelope.status, Status::Error);
}

// ────────────────────────────────────────────────────────────────────────────
// Moderation Tests
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_blocked_output_is_replaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("They deserve to die.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let envelope = client.generate_reply(Intent::Chat, "roast", "roast me").await;
    assert_eq!(envelope.status, Status::Success);
    assert_eq!(envelope.reply_text(), Some(BLOCKED_REPLY));
}

#[tokio::test]
async fn test_blocked_input_sends_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let envelope = client
        .generate_reply(Intent::Chat, "casual", "celebrate deaths")
        .await;
    assert_eq!(envelope.reply_text(), Some(BLOCKED_REPLY));
}
