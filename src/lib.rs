//! Aether: a conversational news and media aggregator.
//!
//! A user message flows through a fixed pipeline:
//! message → intent classification (+ tone detection) → per-source fetch →
//! relevance scoring → pagination or briefing assembly → result envelope.
//!
//! # Architecture
//!
//! - **Intent**: ordered, data-driven keyword rules map text to an [`Intent`]
//! - **Persona**: tone-change phrases switch the persona; each tone renders a
//!   style directive for the reply generator
//! - **Scoring**: text similarity, engagement and recency blended per item
//! - **Session**: per-conversation tone, remembered query, pagination
//!   offsets and last reply
//! - **Handler**: the [`Orchestrator`] routing a turn through all of the above
//! - **Collaborators**: content providers (`aether-sources`) and the
//!   language model ([`llm::OpenAiClient`]) sit behind traits
//! - **Server**: a thin axum transport exposing `POST /chat`

pub mod briefing;
pub mod collaborators;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod intent;
pub mod llm;
pub mod moderation;
pub mod persona;
pub mod scoring;
pub mod server;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use collaborators::{PassthroughRefiner, QueryRefiner, ReplyGenerator};
pub use config::AetherConfig;
pub use envelope::{ResultEnvelope, Status};
pub use error::{AetherError, Result};
pub use handler::{FetchLimits, Orchestrator};
pub use intent::{Intent, classify};
pub use persona::{detect_tone_change, render_persona_prompt};
pub use scoring::score;
pub use server::{AetherServer, AppState};
pub use session::{Session, SessionRegistry};
