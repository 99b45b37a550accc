//! Per-conversation session state.
//!
//! A [`Session`] holds three independently-lifetimed records:
//!
//! - the active persona tone,
//! - the last remembered query plus one pagination offset per source,
//! - the last bot message (and, during a typewriter resume, the split
//!   prefix/remaining pair it was assembled from).
//!
//! State sits behind a short-lived `std::sync::Mutex`; whole turns are
//! serialized by a separate async turn lock so two concurrent requests on
//! one conversation cannot interleave their fetch/remember steps.
//!
//! The [`SessionRegistry`] is bounded: past `max_sessions` the least
//! recently used conversation is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use aether_sources::SourceKind;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::config::DEFAULT_MAX_SESSIONS;
use crate::error::{AetherError, Result};
use crate::persona::DEFAULT_TONE;

/// Pagination step shared by all sources.
pub const PAGE_STEP: usize = 5;

/// Conversation used when a caller does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// A typewriter reply split at the point the client stopped rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialReply {
    pub prefix: String,
    pub remaining: String,
}

/// Plain snapshot of a session's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub tone: String,
    pub last_query: Option<String>,
    pub news_offset: usize,
    pub reddit_offset: usize,
    pub youtube_offset: usize,
    pub last_bot_message: String,
    pub partial: Option<PartialReply>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            tone: DEFAULT_TONE.to_owned(),
            last_query: None,
            news_offset: 0,
            reddit_offset: 0,
            youtube_offset: 0,
            last_bot_message: String::new(),
            partial: None,
        }
    }
}

impl SessionState {
    fn offset_mut(&mut self, source: SourceKind) -> &mut usize {
        match source {
            SourceKind::News => &mut self.news_offset,
            SourceKind::Reddit => &mut self.reddit_offset,
            SourceKind::Youtube => &mut self.youtube_offset,
        }
    }

    /// Current pagination offset for `source`.
    pub fn offset(&self, source: SourceKind) -> usize {
        match source {
            SourceKind::News => self.news_offset,
            SourceKind::Reddit => self.reddit_offset,
            SourceKind::Youtube => self.youtube_offset,
        }
    }
}

/// One logical conversation.
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<SessionState>,
    turn: AsyncMutex<()>,
}

impl Session {
    /// A fresh session in the default tone.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh session starting in `tone`.
    pub fn with_tone(tone: impl Into<String>) -> Self {
        let session = Self::default();
        if let Ok(mut state) = session.state.lock() {
            state.tone = tone.into();
        }
        session
    }

    fn state(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| AetherError::Session("session state lock poisoned".into()))
    }

    /// Wait for exclusive use of this session for one turn.
    pub async fn begin_turn(&self) -> AsyncMutexGuard<'_, ()> {
        self.turn.lock().await
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Result<SessionState> {
        Ok(self.state()?.clone())
    }

    pub fn active_tone(&self) -> Result<String> {
        Ok(self.state()?.tone.clone())
    }

    pub fn set_active_tone(&self, tone: impl Into<String>) -> Result<()> {
        self.state()?.tone = tone.into();
        Ok(())
    }

    /// Remember `query` as the topic for follow-ups and reset every
    /// pagination offset.
    pub fn remember_query(&self, query: impl Into<String>) -> Result<()> {
        let mut state = self.state()?;
        state.last_query = Some(query.into());
        state.news_offset = 0;
        state.reddit_offset = 0;
        state.youtube_offset = 0;
        Ok(())
    }

    pub fn last_query(&self) -> Result<Option<String>> {
        Ok(self.state()?.last_query.clone())
    }

    /// Advance `source`'s offset by one page and return the new offset.
    pub fn advance_offset(&self, source: SourceKind) -> Result<usize> {
        let mut state = self.state()?;
        let offset = state.offset_mut(source);
        *offset += PAGE_STEP;
        Ok(*offset)
    }

    pub fn offset(&self, source: SourceKind) -> Result<usize> {
        Ok(self.state()?.offset(source))
    }

    /// Record a complete bot reply, discarding any partial split.
    pub fn set_last_bot_message(&self, text: impl Into<String>) -> Result<()> {
        let mut state = self.state()?;
        state.last_bot_message = text.into();
        state.partial = None;
        Ok(())
    }

    pub fn last_bot_message(&self) -> Result<String> {
        Ok(self.state()?.last_bot_message.clone())
    }

    /// Record a reply the client is rendering in two halves. The full text
    /// becomes the last bot message.
    pub fn set_partial_reply(&self, prefix: &str, remaining: &str) -> Result<()> {
        let mut state = self.state()?;
        state.last_bot_message = format!("{prefix}{remaining}");
        state.partial = Some(PartialReply {
            prefix: prefix.to_owned(),
            remaining: remaining.to_owned(),
        });
        Ok(())
    }

    pub fn partial_reply(&self) -> Result<Option<PartialReply>> {
        Ok(self.state()?.partial.clone())
    }
}

/// Sessions keyed by conversation ID, created on first use.
///
/// At most `max_sessions` are kept; creating one more evicts the least
/// recently used conversation.
#[derive(Debug)]
pub struct SessionRegistry {
    inner: Mutex<Slots>,
    default_tone: Option<String>,
    max_sessions: usize,
}

#[derive(Debug, Default)]
struct Slots {
    sessions: HashMap<String, Slot>,
    /// Monotonic use counter; higher means more recently used.
    clock: u64,
}

#[derive(Debug)]
struct Slot {
    session: Arc<Session>,
    last_used: u64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Slots::default()),
            default_tone: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose new sessions start in `tone`.
    pub fn with_default_tone(tone: impl Into<String>) -> Self {
        Self {
            default_tone: Some(tone.into()),
            ..Self::default()
        }
    }

    /// Cap the number of live sessions. Values below 1 are treated as 1.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    fn slots(&self) -> Result<MutexGuard<'_, Slots>> {
        self.inner
            .lock()
            .map_err(|_| AetherError::Session("session registry lock poisoned".into()))
    }

    /// The session for `id`, creating it if needed. Blank IDs map to
    /// [`DEFAULT_SESSION_ID`].
    pub fn get_or_create(&self, id: Option<&str>) -> Result<Arc<Session>> {
        let id = id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_SESSION_ID);
        let mut slots = self.slots()?;
        slots.clock += 1;
        let now = slots.clock;

        if let Some(slot) = slots.sessions.get_mut(id) {
            slot.last_used = now;
            return Ok(Arc::clone(&slot.session));
        }

        while slots.sessions.len() >= self.max_sessions {
            let Some(oldest) = slots
                .sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            tracing::debug!(session_id = %oldest, "evicting idle session");
            slots.sessions.remove(&oldest);
        }

        tracing::debug!(session_id = id, "creating session");
        let session = Arc::new(match &self.default_tone {
            Some(tone) => Session::with_tone(tone.clone()),
            None => Session::new(),
        });
        slots.sessions.insert(
            id.to_owned(),
            Slot {
                session: Arc::clone(&session),
                last_used: now,
            },
        );
        Ok(session)
    }

    /// Whether a session for `id` is currently held.
    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .lock()
            .map(|slots| slots.sessions.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|slots| slots.sessions.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
