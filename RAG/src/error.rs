use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the API key: {0}")]
    Authentication(String),

    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("{chunks} chunks but {embeddings} embeddings")]
    EmbeddingMismatch { chunks: usize, embeddings: usize },

    #[error("embedding dimensions differ: query has {query}, index has {index}")]
    DimensionMismatch { query: usize, index: usize },

    #[error("background task failed: {0}")]
    Task(String),

    #[error("invalid splitter configuration: overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidSplitter { chunk_size: usize, overlap: usize },
}

pub type Result<T> = std::result::Result<T, RagError>;
