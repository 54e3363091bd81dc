//! Session State: per-conversation model choice, sampling settings and history.
//!
//! A [`Session`] is plain data. Where it lives between messages is up to a
//! [`SessionStore`]; the terminal front-end uses [`InMemorySessionStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::inference::types::ChatMessage;
use crate::TokioMutex;

// ─── Constants ──────────────────────────────────────────────────────────────

/// Model selected when a chat starts.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano-2025-04-14";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const DEFAULT_MAX_TOKENS: u32 = 1000;

// ─── Session ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Id of the active model (a catalog id).
    pub current_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Append-only conversation history.
    history: Vec<ChatMessage>,
}

impl Session {
    /// A fresh session with the default model and sampling settings.
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_MAX_TOKENS)
    }

    pub fn with_settings(model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            current_model: model.into(),
            temperature,
            max_tokens,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.history.push(message);
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.history.last()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ─── SessionStore ───────────────────────────────────────────────────────────

/// Get/set storage for sessions, keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Option<Session>;

    async fn set(&self, session: Session);

    async fn remove(&self, id: Uuid) -> Option<Session>;
}

/// Process-local store. Sessions share nothing but the map itself.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: TokioMutex<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions.lock().await.get(&id).cloned()
    }

    async fn set(&self, session: Session) {
        self.sessions.lock().await.insert(session.id, session);
    }

    async fn remove(&self, id: Uuid) -> Option<Session> {
        self.sessions.lock().await.remove(&id)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
