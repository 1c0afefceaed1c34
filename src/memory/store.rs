use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MemoryError;
use crate::embedding::cosine_similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversation turn. Never modified once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    /// Producer tag, e.g. `rag` for grounded chat replies.
    pub source: Option<String>,
}

impl Message {
    pub fn new(
        session_id: impl Into<String>,
        role: Role,
        content: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            role,
            content: content.into(),
            embedding,
            created_at: Utc::now(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A past message and its similarity to the query embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMessage {
    pub message: Message,
    pub score: f32,
}

/// Append-only, session-scoped message log.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: Message) -> Result<(), MemoryError>;

    /// Last `limit` messages of the session, oldest first.
    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>, MemoryError>;

    /// Up to `limit` session messages with cosine similarity `>= threshold`, best first.
    async fn similar(
        &self,
        session_id: &str,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredMessage>, MemoryError>;
}

pub(crate) type SessionLog = Arc<RwLock<Vec<Message>>>;

/// Process-local [`MessageStore`].
///
/// Each session has its own lock. The outer map lock is only held to look up or
/// create a session, so work on one session never waits on another.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    sessions: RwLock<HashMap<String, SessionLog>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_len(&self, session_id: &str) -> usize {
        let Some(log) = self.session(session_id) else {
            return 0;
        };
        log.read().len()
    }

    /// Full history of a session in insertion order.
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        let Some(log) = self.session(session_id) else {
            return Vec::new();
        };
        log.read().clone()
    }

    pub(crate) fn session(&self, session_id: &str) -> Option<SessionLog> {
        self.sessions.read().get(session_id).cloned()
    }

    fn session_or_create(&self, session_id: &str) -> SessionLog {
        if let Some(log) = self.session(session_id) {
            return log;
        }
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: Message) -> Result<(), MemoryError> {
        let log = self.session_or_create(&message.session_id);
        log.write().push(message);
        Ok(())
    }

    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>, MemoryError> {
        let Some(log) = self.session(session_id) else {
            return Ok(Vec::new());
        };
        let messages = log.read();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn similar(
        &self,
        session_id: &str,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredMessage>, MemoryError> {
        let Some(log) = self.session(session_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredMessage> = log
            .read()
            .iter()
            .filter(|m| !m.embedding.is_empty())
            .map(|m| ScoredMessage {
                score: cosine_similarity(query_embedding, &m.embedding),
                message: m.clone(),
            })
            .filter(|s| s.score >= threshold)
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }
}
