//! HTTP transport for the conversation layer.
//!
//! ## Endpoints
//!
//! - `POST /chat`: run one turn, or continue a typewriter reply, or load
//!   more items from one source
//! - `POST /chat_event`: log a client-side event
//! - `GET /debug_ping`: liveness probe
//!
//! Every `/chat` outcome is a [`ResultEnvelope`] with HTTP 200, including
//! failures.

use std::net::SocketAddr;
use std::sync::Arc;

use aether_sources::SourceKind;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::config::{AetherConfig, ServerConfig};
use crate::envelope::ResultEnvelope;
use crate::error::{AetherError, Result};
use crate::handler::{FetchLimits, Orchestrator};
use crate::llm::OpenAiClient;
use crate::session::SessionRegistry;

/// Reply for a `/chat` request with no message and no resume flag.
pub const EMPTY_CHAT_MESSAGE: &str = "Please enter a message.";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /chat`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    /// The user's message.
    pub message: Option<String>,
    /// Conversation to run the turn on. Blank means the default one.
    pub session_id: Option<String>,
    /// Continue a reply the client stopped rendering part-way.
    pub resume: bool,
    /// Already-rendered part of the reply being resumed.
    pub prefix: Option<String>,
    /// Unrendered rest of the reply being resumed.
    pub remaining: Option<String>,
    /// Load more raw items from the source named by `source`.
    pub append: bool,
    /// Source for `append`: `news`, `reddit` or `youtube`.
    #[serde(rename = "type")]
    pub source: Option<String>,
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Shared state behind every route.
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, sessions: SessionRegistry) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sessions: Arc::new(sessions),
        }
    }

    /// Wire the live providers and the chat-completions client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or an HTTP client cannot
    /// be built.
    pub fn from_config(config: &AetherConfig) -> Result<Self> {
        config.validate()?;
        let providers = aether_sources::build_providers(&config.sources)?;
        let llm = Arc::new(OpenAiClient::new(&config.llm, config.persona.tones.clone())?);
        let orchestrator = Orchestrator::new(providers, llm.clone(), llm)
            .with_tones(config.persona.tones.clone())
            .with_rules(config.intent.clone())
            .with_limits(FetchLimits::from_config(&config.sources))
            .with_shuffle_seed(config.briefing.shuffle_seed);
        Ok(Self::new(
            orchestrator,
            SessionRegistry::with_default_tone(config.persona.default_tone.clone())
                .with_max_sessions(config.server.max_sessions),
        ))
    }
}

/// Build the router without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handle_chat))
        .route("/chat_event", post(handle_chat_event))
        .route("/debug_ping", get(handle_debug_ping))
        .with_state(state)
}

/// The conversation HTTP server running on a background task.
pub struct AetherServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Handle to the background server task.
    handle: JoinHandle<()>,
}

impl AetherServer {
    /// Bind `{config.host}:{config.port}` (port `0` picks a free port) and
    /// serve in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns [`AetherError::Server`] if the listener cannot bind.
    pub async fn start(state: AppState, config: &ServerConfig) -> Result<Self> {
        let app = router(state);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AetherError::Server(format!("bind {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| AetherError::Server(format!("failed to get local addr: {e}")))?;

        info!("aether listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("aether server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait until the server task ends.
    ///
    /// # Errors
    ///
    /// Returns [`AetherError::Server`] if the task panicked.
    pub async fn wait(&mut self) -> Result<()> {
        (&mut self.handle)
            .await
            .map_err(|e| AetherError::Server(format!("server task failed: {e}")))
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for AetherServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /chat`. Unreadable bodies still get an envelope.
async fn handle_chat(
    State(state): State<AppState>,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ResultEnvelope> {
    let request_id = Uuid::new_v4();
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(%request_id, status = %rejection.status(), "rejected chat body");
            return Json(ResultEnvelope::failure(format!(
                "Internal error: {}",
                rejection.body_text()
            )));
        }
    };
    Json(
        chat(state, request)
            .instrument(tracing::info_span!("chat", %request_id))
            .await,
    )
}

async fn chat(state: AppState, request: ChatRequest) -> ResultEnvelope {
    let message = request.message.as_deref().unwrap_or_default().trim().to_owned();
    if message.is_empty() && !request.resume {
        return ResultEnvelope::failure(EMPTY_CHAT_MESSAGE);
    }

    let session = match state.sessions.get_or_create(request.session_id.as_deref()) {
        Ok(session) => session,
        Err(err) => return internal_error(&err),
    };

    if request.append {
        let source = request.source.as_deref().unwrap_or("news");
        return append_results(&state, source, &message).await;
    }

    if request.resume {
        let prefix = request.prefix.unwrap_or_default();
        let remaining = request.remaining.unwrap_or_default();
        info!(
            prefix_len = prefix.len(),
            remaining_len = remaining.len(),
            "resuming reply"
        );
        if let Err(err) = session.set_partial_reply(&prefix, &remaining) {
            return internal_error(&err);
        }
        return ResultEnvelope::notice(remaining).with_resume(true);
    }

    let orchestrator = Arc::clone(&state.orchestrator);
    let turn = tokio::spawn(
        async move {
            // No explicit tone: the handler reads the active one under the turn lock.
            let intent = orchestrator.classify(&message);
            orchestrator.handle(&session, Some(intent), None, &message).await
        }
        .in_current_span(),
    );

    match turn.await {
        Ok(envelope) => envelope.with_resume(false),
        Err(err) => internal_error(&AetherError::Server(format!("turn task failed: {err}"))),
    }
}

async fn append_results(state: &AppState, source: &str, topic: &str) -> ResultEnvelope {
    let Some(kind) = SourceKind::all().iter().copied().find(|k| k.name() == source) else {
        return ResultEnvelope::success(Vec::new());
    };
    info!(source = %kind, "loading more items");
    match state.orchestrator.fetch_more(kind, topic).await {
        Ok(items) => ResultEnvelope::success(items),
        Err(err) => {
            tracing::warn!(source = %kind, error = %err, "load more failed");
            ResultEnvelope::failure(format!("⚠️ Couldn’t load more {source}."))
        }
    }
}

fn internal_error(err: &AetherError) -> ResultEnvelope {
    tracing::error!(error = %err, "chat request failed");
    ResultEnvelope::failure(format!("Internal error: {err}"))
}

/// `POST /chat_event`.
async fn handle_chat_event(Json(event): Json<serde_json::Value>) -> StatusCode {
    info!(%event, "client event");
    StatusCode::NO_CONTENT
}

/// `GET /debug_ping`.
async fn handle_debug_ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_owned(),
        message: "Aether backend active.".to_owned(),
    })
}
