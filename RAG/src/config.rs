//! Fixed pipeline parameters.
//!
//! None of these are user-configurable; the only value a user supplies is
//! the provider credential.

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 150;

/// Number of chunks retrieved per question.
pub const RETRIEVAL_K: usize = 4;

pub const CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const CHAT_TEMPERATURE: f32 = 0.0;

pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// Maximum inputs per embeddings request.
pub const EMBEDDING_BATCH_SIZE: usize = 1000;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
