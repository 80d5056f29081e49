//! Question answering over one indexed document.
//!
//! `ask` runs three stages, each callable on its own:
//! reformulate the follow-up into a standalone question, retrieve the
//! closest chunks for it, then complete an answer from those chunks.

use crate::chat_service::ChatModel;
use crate::config::RETRIEVAL_K;
use crate::document_processor::DocumentProcessor;
use crate::embedding_service::Embedder;
use crate::error::{RagError, Result};
use crate::models::*;
use crate::text_splitter::TextSplitter;
use crate::vector_store::VectorIndex;
use std::path::Path;
use std::sync::Arc;

const CONDENSE_QUESTION_PROMPT: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

const ANSWER_INSTRUCTION: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

pub struct ConversationalRetrievalChain {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    chat_model: Arc<dyn ChatModel>,
    k: usize,
}

impl std::fmt::Debug for ConversationalRetrievalChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationalRetrievalChain")
            .field("index", &self.index)
            .field("k", &self.k)
            .finish_non_exhaustive()
    }
}

impl ConversationalRetrievalChain {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>, chat_model: Arc<dyn ChatModel>) -> Self {
        Self {
            index,
            embedder,
            chat_model,
            k: RETRIEVAL_K,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub async fn ask(&self, question: &str, history: &[QaTurn]) -> Result<ChainResponse> {
        let generated_question = self.reformulate(question, history).await?;
        let source_documents = self.retrieve(&generated_question).await?;
        let answer = self.complete(question, &source_documents).await?;

        log::info!(
            "Answered question with {} source chunks",
            source_documents.len()
        );

        Ok(ChainResponse {
            answer,
            generated_question,
            source_documents,
        })
    }

    /// Rewrites `question` as a standalone query. Without history there is
    /// nothing to resolve and no remote call is made.
    pub async fn reformulate(&self, question: &str, history: &[QaTurn]) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let messages = vec![ChatMessage::user(build_condense_prompt(question, history))];
        let standalone = self.chat_model.complete(&messages).await?;
        let standalone = standalone.trim();

        log::debug!("Reformulated question: {}", standalone);

        if standalone.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(standalone.to_string())
        }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        self.index.search(&query_embedding, self.k)
    }

    pub async fn complete(&self, question: &str, sources: &[ScoredChunk]) -> Result<String> {
        let messages = build_answer_messages(question, sources);
        self.chat_model.complete(&messages).await
    }
}

/// Loads, splits, embeds and indexes a PDF, then wraps the index in a chain.
/// Text extraction runs on the blocking pool.
pub async fn build_chain(
    file_path: &Path,
    filename: &str,
    embedder: Arc<dyn Embedder>,
    chat_model: Arc<dyn ChatModel>,
) -> Result<(ConversationalRetrievalChain, IndexSummary)> {
    let file_path = file_path.to_path_buf();
    let filename = filename.to_string();
    let document = tokio::task::spawn_blocking(move || {
        DocumentProcessor::new().load_pdf_as(&file_path, &filename)
    })
    .await
    .map_err(|e| RagError::Task(e.to_string()))??;

    index_document(&document, embedder, chat_model).await
}

/// The part of [`build_chain`] after text extraction.
pub async fn index_document(
    document: &Document,
    embedder: Arc<dyn Embedder>,
    chat_model: Arc<dyn ChatModel>,
) -> Result<(ConversationalRetrievalChain, IndexSummary)> {
    let chunks = TextSplitter::default().split_document(document);
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

    let embeddings = embedder.embed_documents(&texts).await?;
    let index = VectorIndex::build(chunks, embeddings)?;

    let summary = IndexSummary {
        filename: document.filename.clone(),
        pages: document.pages.len(),
        chunks: index.len(),
    };

    log::info!(
        "Indexed {}: {} pages, {} chunks",
        summary.filename,
        summary.pages,
        summary.chunks
    );

    Ok((ConversationalRetrievalChain::new(index, embedder, chat_model), summary))
}

fn format_history(history: &[QaTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_condense_prompt(question: &str, history: &[QaTurn]) -> String {
    format!(
        "{}\n\nChat History:\n{}\nFollow Up Input: {}\nStandalone question:",
        CONDENSE_QUESTION_PROMPT,
        format_history(history),
        question
    )
}

fn build_answer_messages(question: &str, sources: &[ScoredChunk]) -> Vec<ChatMessage> {
    let context = sources
        .iter()
        .map(|s| s.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(format!("{}\n----------------\n{}", ANSWER_INSTRUCTION, context)),
        ChatMessage::user(question),
    ]
}
