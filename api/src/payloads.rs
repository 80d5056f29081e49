use crate::session::{Session, SessionStatus};
use crate::error::MISSING_CREDENTIAL_WARNING;
use pdfchat_rag::{ChainResponse, IndexSummary, QaTurn, ScoredChunk};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

const PREVIEW_GRAPHEMES: usize = 200;

#[derive(Deserialize)]
pub struct AskPayload {
    pub question: String,
}

#[derive(Serialize)]
pub struct SessionView {
    pub status: SessionStatus,
    /// Masked form of the stored credential.
    pub credential: Option<String>,
    pub document: Option<IndexSummary>,
    pub history: Vec<QaTurn>,
    pub warning: Option<String>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let status = session.status();
        Self {
            status,
            credential: session.credential().map(|k| k.masked()),
            document: session.document().cloned(),
            history: session.history().to_vec(),
            warning: (status == SessionStatus::Unconfigured)
                .then(|| MISSING_CREDENTIAL_WARNING.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub document: IndexSummary,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct SourceView {
    pub source: String,
    pub page: usize,
    pub score: f32,
    pub content: String,
    pub preview: String,
}

impl From<ScoredChunk> for SourceView {
    fn from(scored: ScoredChunk) -> Self {
        let preview = preview(&scored.chunk.content);
        Self {
            source: scored.chunk.source,
            page: scored.chunk.page,
            score: scored.score,
            content: scored.chunk.content,
            preview,
        }
    }
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub generated_question: String,
    pub sources: Vec<SourceView>,
}

impl From<ChainResponse> for AskResponse {
    fn from(response: ChainResponse) -> Self {
        Self {
            answer: response.answer,
            generated_question: response.generated_question,
            sources: response
                .source_documents
                .into_iter()
                .map(SourceView::from)
                .collect(),
        }
    }
}

/// First few hundred user-perceived characters of a chunk, collapsed to one line.
fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut graphemes = flat.graphemes(true);
    let head: String = graphemes.by_ref().take(PREVIEW_GRAPHEMES).collect();

    if graphemes.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_preview_is_unchanged() {
        assert_eq!(preview("The capital of\nFrance is Paris."), "The capital of France is Paris.");
    }

    #[test]
    fn test_long_preview_is_truncated_on_graphemes() {
        let text = "e\u{301}".repeat(250);
        let out = preview(&text);
        assert!(out.ends_with("..."));
        assert_eq!(out.trim_end_matches("...").graphemes(true).count(), PREVIEW_GRAPHEMES);
    }

    #[test]
    fn test_unconfigured_session_view_has_warning() {
        let view = SessionView::from(&Session::new());
        assert_eq!(view.status, SessionStatus::Unconfigured);
        assert_eq!(view.warning.as_deref(), Some(MISSING_CREDENTIAL_WARNING));
        assert!(view.credential.is_none());
    }
}
