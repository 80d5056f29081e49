use crate::error::{RagError, Result};
use crate::models::{DocumentChunk, ScoredChunk};
use rayon::prelude::*;

/// In-memory (embedding, chunk) pairs for one uploaded document.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<(Vec<f32>, DocumentChunk)>,
}

impl VectorIndex {
    /// Pairs chunks with their embeddings position by position.
    pub fn build(chunks: Vec<DocumentChunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::EmbeddingMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let entries = embeddings.into_iter().zip(chunks).collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.entries.iter().map(|(_, chunk)| chunk)
    }

    /// Top `k` chunks by cosine similarity, best first. Equal scores keep
    /// insertion order. An empty index returns nothing.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .par_iter()
            .enumerate()
            .map(|(idx, (embedding, _))| {
                calculate_similarity(query_embedding, embedding).map(|score| (idx, score))
            })
            .collect::<Result<_>>()?;

        // Stable sort, so ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let results: Vec<ScoredChunk> = scored
            .into_iter()
            .take(k)
            .map(|(idx, score)| ScoredChunk {
                chunk: self.entries[idx].1.clone(),
                score,
            })
            .collect();

        log::debug!("Found {} relevant chunks", results.len());
        Ok(results)
    }
}

/// Cosine similarity; 0 when either vector has zero norm. Vectors of
/// different dimensions cannot be compared.
pub fn calculate_similarity(query: &[f32], embedding: &[f32]) -> Result<f32> {
    if query.len() != embedding.len() {
        return Err(RagError::DimensionMismatch {
            query: query.len(),
            index: embedding.len(),
        });
    }

    let dot_product: f32 = query.iter().zip(embedding).map(|(a, b)| a * b).sum();
    let norm1: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm2: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm1 == 0.0 || norm2 == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm1 * norm2))
    }
}
