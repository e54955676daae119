//! 聊天会话存储：每个集合只保存一段对话，读后写、后写者胜。
//!
//! Chat session persistence.
//!
//! The store is deliberately narrow: the chat routes only ever need the single
//! current conversation, a way to create it, append turns and wipe it.
//! [`InMemorySessionStore`] is the bundled backend; anything durable plugs in
//! behind [`SessionStore`].

use crate::request::HISTORY_WINDOW;
use crate::types::ConversationTurn;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Model a freshly created session starts on.
pub const DEFAULT_SESSION_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    NotFound(String),

    #[error("session backend unavailable: {0}")]
    Unavailable(String),
}

/// One persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub messages: Vec<ConversationTurn>,
    pub current_model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(current_model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            current_model: current_model.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.messages.push(turn);
        self.updated_at = Utc::now();
    }

    /// Up to `window` turns preceding the most recent one.
    pub fn context_window(&self, window: usize) -> Vec<ConversationTurn> {
        let prior = match self.messages.split_last() {
            Some((_, rest)) => rest,
            None => return Vec::new(),
        };
        let start = prior.len().saturating_sub(window);
        prior[start..].to_vec()
    }

    /// [`context_window`](Self::context_window) with the default history window.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.context_window(HISTORY_WINDOW)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The current conversation, if one exists.
    async fn find_session(&self) -> Result<Option<ChatSession>, StoreError>;

    async fn create_session(&self, current_model: &str) -> Result<ChatSession, StoreError>;

    /// Append one turn and return the updated session.
    async fn append_turn(
        &self,
        session_id: &str,
        turn: ConversationTurn,
    ) -> Result<ChatSession, StoreError>;

    /// Persist the whole session, replacing what was stored.
    async fn save(&self, session: &ChatSession) -> Result<(), StoreError>;

    /// Remove every message; returns how many were dropped.
    async fn clear(&self) -> Result<usize, StoreError>;

    fn name(&self) -> &'static str;

    async fn find_or_create(&self, current_model: &str) -> Result<ChatSession, StoreError> {
        match self.find_session().await? {
            Some(session) => Ok(session),
            None => self.create_session(current_model).await,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session: RwLock<Option<ChatSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_session(&self) -> Result<Option<ChatSession>, StoreError> {
        Ok(self.session.read().await.clone())
    }

    async fn create_session(&self, current_model: &str) -> Result<ChatSession, StoreError> {
        let session = ChatSession::new(current_model);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn append_turn(
        &self,
        session_id: &str,
        turn: ConversationTurn,
    ) -> Result<ChatSession, StoreError> {
        let mut guard = self.session.write().await;
        match guard.as_mut() {
            Some(session) if session.id == session_id => {
                session.push(turn);
                Ok(session.clone())
            }
            _ => Err(StoreError::NotFound(session_id.to_string())),
        }
    }

    async fn save(&self, session: &ChatSession) -> Result<(), StoreError> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let mut guard = self.session.write().await;
        Ok(match guard.as_mut() {
            Some(session) => {
                let removed = session.messages.len();
                session.messages.clear();
                session.updated_at = Utc::now();
                removed
            }
            None => 0,
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
