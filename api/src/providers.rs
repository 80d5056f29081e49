use pdfchat_rag::{ApiKey, ChatModel, ChatService, Embedder, EmbeddingService, ProviderClient};
use reqwest::Client;
use std::sync::Arc;

/// Builds provider clients bound to a session's credential.
pub trait ProviderFactory: Send + Sync {
    fn embedder(&self, api_key: &ApiKey) -> Arc<dyn Embedder>;
    fn chat_model(&self, api_key: &ApiKey) -> Arc<dyn ChatModel>;
}

/// OpenAI-compatible HTTP provider sharing one connection pool.
pub struct OpenAiProviders {
    client: Client,
    base_url: String,
}

impl OpenAiProviders {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn provider(&self, api_key: &ApiKey) -> ProviderClient {
        ProviderClient::new(self.client.clone(), self.base_url.clone(), api_key.clone())
    }
}

impl ProviderFactory for OpenAiProviders {
    fn embedder(&self, api_key: &ApiKey) -> Arc<dyn Embedder> {
        Arc::new(EmbeddingService::new(self.provider(api_key)))
    }

    fn chat_model(&self, api_key: &ApiKey) -> Arc<dyn ChatModel> {
        Arc::new(ChatService::new(self.provider(api_key)))
    }
}
