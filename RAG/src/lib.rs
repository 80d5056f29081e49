pub mod chain;
pub mod chat_service;
pub mod config;
pub mod document_processor;
pub mod embedding_service;
pub mod error;
pub mod models;
pub mod provider;
pub mod text_splitter;
pub mod vector_store;

pub use chain::{build_chain, index_document, ConversationalRetrievalChain};
pub use chat_service::{ChatModel, ChatService};
pub use document_processor::DocumentProcessor;
pub use embedding_service::{Embedder, EmbeddingService};
pub use error::{RagError, Result};
pub use models::*;
pub use provider::{ApiKey, ProviderClient};
pub use text_splitter::TextSplitter;
pub use vector_store::VectorIndex;
