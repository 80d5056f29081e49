use crate::config::{CHAT_MODEL, CHAT_TEMPERATURE};
use crate::error::{RagError, Result};
use crate::models::*;
use crate::provider::ProviderClient;
use async_trait::async_trait;

/// A single chat-completion round trip.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Chat-completions endpoint of an OpenAI-compatible provider.
pub struct ChatService {
    provider: ProviderClient,
    model: String,
    temperature: f32,
}

impl ChatService {
    pub fn new(provider: ProviderClient) -> Self {
        Self {
            provider,
            model: CHAT_MODEL.to_string(),
            temperature: CHAT_TEMPERATURE,
        }
    }
}

#[async_trait]
impl ChatModel for ChatService {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response: ChatResponse = self.provider.post_json("chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RagError::InvalidResponse("no choices returned".to_string()))
    }
}
