use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, error};

use super::{CompletionError, CompletionProvider, CompletionRequest, with_deadline};

/// [`CompletionProvider`] over [`genai::Client`].
///
/// The provider is inferred from the model name by `genai`; credentials come from the
/// provider's usual environment variable (e.g. `OPENAI_API_KEY`).
#[derive(Clone)]
pub struct GenaiCompletion {
    client: Client,
    model: String,
}

impl std::fmt::Debug for GenaiCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiCompletion")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiCompletion {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for GenaiCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let chat_req = ChatRequest::new(vec![
            ChatMessage::system(request.system.clone()),
            ChatMessage::user(request.user.clone()),
        ]);
        let options = ChatOptions::default().with_temperature(f64::from(request.temperature));

        debug!(
            model = %self.model,
            prompt_len = request.user.len(),
            timeout_secs = request.timeout.as_secs(),
            "Sending completion request"
        );

        with_deadline(request.timeout, async {
            let resp = self
                .client
                .exec_chat(&self.model, chat_req, Some(&options))
                .await
                .map_err(|e| {
                    error!(model = %self.model, error = %e, "Provider error");
                    CompletionError::Transport {
                        reason: e.to_string(),
                    }
                })?;

            match resp.first_text() {
                Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
                _ => Err(CompletionError::EmptyResponse),
            }
        })
        .await
    }
}
