use crate::config::ServerConfig;
use crate::providers::{OpenAiProviders, ProviderFactory};
use crate::session::SessionStore;
use std::sync::Arc;

/// Shared application state for all route handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub providers: Arc<dyn ProviderFactory>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let providers = Arc::new(OpenAiProviders::new(config.provider_base_url.clone()));
        Self::with_providers(config, providers)
    }

    pub fn with_providers(config: ServerConfig, providers: Arc<dyn ProviderFactory>) -> Self {
        Self {
            sessions: SessionStore::new(),
            providers,
            config: Arc::new(config),
        }
    }
}
