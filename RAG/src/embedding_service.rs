use crate::config::{EMBEDDING_BATCH_SIZE, EMBEDDING_MODEL};
use crate::error::{RagError, Result};
use crate::models::*;
use crate::provider::ProviderClient;
use async_trait::async_trait;

/// Turns text into vectors. Implementations are expected to be remote calls.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::InvalidResponse("no embedding returned for query".to_string()))
    }
}

/// Embeddings endpoint of an OpenAI-compatible provider.
pub struct EmbeddingService {
    provider: ProviderClient,
    model: String,
    batch_size: usize,
}

impl EmbeddingService {
    pub fn new(provider: ProviderClient) -> Self {
        Self {
            provider,
            model: EMBEDDING_MODEL.to_string(),
            batch_size: EMBEDDING_BATCH_SIZE,
        }
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: batch,
        };

        let response: EmbeddingResponse = self.provider.post_json("embeddings", &request).await?;
        order_embeddings(response, batch.len())
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch).await?);
            log::debug!("Embedded {}/{} texts", embeddings.len(), texts.len());
        }

        Ok(embeddings)
    }
}

/// The provider tags each vector with its input index; don't trust response order.
fn order_embeddings(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

    for item in response.data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            RagError::InvalidResponse(format!(
                "embedding index {} out of range for {} inputs",
                item.index, expected
            ))
        })?;
        *slot = Some(item.embedding);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.ok_or_else(|| RagError::InvalidResponse(format!("missing embedding for input {}", idx)))
        })
        .collect()
}
