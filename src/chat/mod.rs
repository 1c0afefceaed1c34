//! Grounded follow-up chat over [`ConversationMemory`].

mod error;
pub mod prompt;


pub use error::ChatError;
pub use prompt::{CHAT_SYSTEM_PROMPT, build_chat_prompt};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::constants::{DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_TEMPERATURE};
use crate::memory::{ConversationMemory, Role};

/// Source tag stored on assistant replies.
pub const REPLY_SOURCE: &str = "rag";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
}

pub struct ChatEngine {
    memory: Arc<ConversationMemory>,
    completion: Arc<dyn CompletionProvider>,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("memory", &self.memory)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ChatEngine {
    pub fn new(memory: Arc<ConversationMemory>, completion: Arc<dyn CompletionProvider>) -> Self {
        Self {
            memory,
            completion,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    /// Answers one user message.
    ///
    /// Context is gathered before the user turn is stored, so the new message never
    /// matches itself. The user turn is stored before generation and the reply after
    /// it; storage failures are logged and do not affect the returned reply.
    #[instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn turn(&self, session_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        let session_id = session_id.trim();
        let message = message.trim();
        if session_id.is_empty() {
            return Err(ChatError::MissingSession);
        }
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let embedding = self.memory.embed(message).await?;
        let bundle = self
            .memory
            .build_context_with_embedding(session_id, message, &embedding)
            .await?;

        if let Err(e) = self
            .memory
            .append_with_embedding(session_id, Role::User, message, embedding, None)
            .await
        {
            warn!(session_id, error = %e, "Failed to store user message");
        }

        let request = CompletionRequest::new(CHAT_SYSTEM_PROMPT, build_chat_prompt(&bundle, message))
            .with_temperature(self.temperature)
            .with_timeout(self.timeout);
        let reply = self.completion.complete(&request).await?;

        if let Err(e) = self
            .memory
            .append(session_id, Role::Assistant, &reply, Some(REPLY_SOURCE))
            .await
        {
            warn!(session_id, error = %e, "Failed to store assistant reply");
        }

        info!(
            session_id,
            recent = bundle.recent.len(),
            similar = bundle.similar.len(),
            knowledge = bundle.knowledge.len(),
            reply_len = reply.len(),
            "Chat turn complete"
        );
        Ok(ChatReply {
            reply,
            session_id: session_id.to_string(),
        })
    }
}
