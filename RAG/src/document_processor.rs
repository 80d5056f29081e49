use crate::error::{RagError, Result};
use crate::models::*;
use pdf_extract::extract_text_by_pages;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use uuid::Uuid;

pub struct DocumentProcessor;

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn load_pdf(&self, file_path: &Path) -> Result<Document> {
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());
        self.load_pdf_as(file_path, &filename)
    }

    /// Loads `file_path` but records `filename` as the source, for uploads
    /// that were spooled to a temporary path.
    pub fn load_pdf_as(&self, file_path: &Path, filename: &str) -> Result<Document> {
        log::info!("Processing PDF: {}", filename);

        // Surface a missing or unreadable file as an I/O error rather than a
        // parse error.
        fs::metadata(file_path)?;

        let raw_pages = extract_text_by_pages(file_path).map_err(|e| RagError::Pdf(e.to_string()))?;
        let pages = self.number_pages(raw_pages);

        log::info!("Extracted {} pages from {}", pages.len(), filename);

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            pages,
        })
    }

    /// Numbers extracted page texts from 1 and normalises each one.
    /// Blank pages keep their slot so later page numbers stay true.
    pub fn number_pages<S: AsRef<str>>(&self, raw_pages: impl IntoIterator<Item = S>) -> Vec<Page> {
        raw_pages
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Page {
                number: idx + 1,
                text: self.clean_text(text.as_ref()),
            })
            .collect()
    }

    pub fn clean_text(&self, text: &str) -> String {
        static RE_SPACES: OnceLock<Regex> = OnceLock::new();
        static RE_BLANK_LINES: OnceLock<Regex> = OnceLock::new();

        let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[ \t\r]+").expect("valid regex"));
        let re_blank_lines =
            RE_BLANK_LINES.get_or_init(|| Regex::new(r"\n(?: ?\n){2,}").expect("valid regex"));

        let cleaned = re_spaces.replace_all(text, " ");
        let cleaned = re_blank_lines.replace_all(&cleaned, "\n\n");

        cleaned.trim().to_string()
    }
}
