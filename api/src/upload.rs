use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::Multipart;
use pdfchat_rag::{
    index_document, ChatModel, ConversationalRetrievalChain, DocumentProcessor, Embedder,
    IndexSummary,
};
use std::io::Write;
use std::sync::Arc;

const FILE_FIELD: &str = "file";
const DEFAULT_FILENAME: &str = "upload.pdf";

pub struct PdfUpload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Pulls the `file` field out of a multipart upload.
pub async fn read_pdf_field(multipart: &mut Multipart) -> Result<PdfUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        return Ok(PdfUpload { filename, bytes });
    }

    Err(ApiError::bad_request("Upload a PDF file in the `file` field"))
}

/// Spools the upload to a private temporary file, extracts its pages, then
/// indexes them. The temporary file is removed as soon as extraction ends.
pub async fn index_upload(
    upload: PdfUpload,
    embedder: Arc<dyn Embedder>,
    chat_model: Arc<dyn ChatModel>,
) -> Result<(ConversationalRetrievalChain, IndexSummary), ApiError> {
    let PdfUpload { filename, bytes } = upload;

    let document = tokio::task::spawn_blocking(move || {
        let mut spooled = tempfile::Builder::new()
            .prefix("pdfchat-")
            .suffix(".pdf")
            .tempfile()?;
        spooled.write_all(&bytes)?;
        spooled.flush()?;

        DocumentProcessor::new().load_pdf_as(spooled.path(), &filename)
    })
    .await
    .map_err(|e| ApiError::internal(format!("PDF processing task failed: {}", e)))??;

    Ok(index_document(&document, embedder, chat_model).await?)
}
