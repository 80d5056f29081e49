use crate::config::{CHUNK_OVERLAP, CHUNK_SIZE};
use crate::error::{RagError, Result};
use crate::models::{Document, DocumentChunk};
use uuid::Uuid;

/// Cut points are tried in this order before falling back to a hard cut.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A character range of the input and the text it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Character-based splitter with fixed overlap.
///
/// Every chunk is an exact substring of its page, and consecutive chunks on
/// the same page share exactly `overlap` characters, so dropping the first
/// `overlap` characters of every chunk but the first and concatenating
/// gives the page back.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            overlap: CHUNK_OVERLAP,
        }
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(RagError::InvalidSplitter { chunk_size, overlap });
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<Span> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            if len - start <= self.chunk_size {
                spans.push(make_span(&chars, start, len));
                break;
            }

            let end = self.find_cut(&chars, start);
            spans.push(make_span(&chars, start, end));
            start = end - self.overlap;
        }

        spans
    }

    /// Splits every non-empty page of `document` independently.
    pub fn split_document(&self, document: &Document) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();

        for page in document.non_empty_pages() {
            for span in self.split_text(&page.text) {
                chunks.push(DocumentChunk {
                    id: Uuid::new_v4().to_string(),
                    content: span.text,
                    source: document.filename.clone(),
                    page: page.number,
                    start_position: span.start,
                    end_position: span.end,
                });
            }
        }

        log::info!(
            "Created {} chunks from {} ({} pages)",
            chunks.len(),
            document.filename,
            document.pages.len()
        );
        chunks
    }

    /// End of the chunk starting at `start`. Always in
    /// `start + overlap + 1 ..= start + chunk_size` so the next chunk makes
    /// progress.
    fn find_cut(&self, chars: &[char], start: usize) -> usize {
        let window_end = start + self.chunk_size;
        let min_end = start + self.overlap + 1;

        for separator in SEPARATORS {
            let sep: Vec<char> = separator.chars().collect();
            if window_end < start + sep.len() {
                continue;
            }

            let mut pos = window_end - sep.len();
            loop {
                let cut = pos + sep.len();
                if cut < min_end {
                    break;
                }
                if chars[pos..cut] == sep[..] {
                    return cut;
                }
                if pos == start {
                    break;
                }
                pos -= 1;
            }
        }

        window_end
    }
}

fn make_span(chars: &[char], start: usize, end: usize) -> Span {
    Span {
        start,
        end,
        text: chars[start..end].iter().collect(),
    }
}
