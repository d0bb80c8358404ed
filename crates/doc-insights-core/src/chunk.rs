//! Sentence-aware, overlapping text chunker.
//!
//! Splits document text into overlapping windows of `size` characters,
//! pulling each window's end back to the last sentence terminator when one
//! sits past the window's midpoint. Adjacent chunks share `overlap`
//! characters so retrieval keeps context across boundaries.
//!
//! Each [`Chunk`] record receives a random UUID, a SHA-256 hash of its text
//! and a best-effort page number (see [`attribute_page`]).
//!
//! # Algorithm
//!
//! 1. Start a window at offset 0 with end `start + size`.
//! 2. If the window ends before the text does, find the last `.`, `!` or
//!    `?` inside it. If that terminator lies beyond `start + size / 2`,
//!    end the window just after it.
//! 3. Trim the window; keep it if anything is left.
//! 4. Continue from `end - overlap` (always at least one character further
//!    on), where `end` is the window end before clamping to the text
//!    length. Stop once that start reaches the end of the text.
//!
//! Offsets count Unicode scalar values, never bytes.
//!
//! # Example
//!
//! ```rust
//! use doc_insights_core::chunk::{chunk_text, ChunkParams};
//!
//! let chunks = chunk_text("Hello world. Second sentence.", ChunkParams::default()).unwrap();
//! assert_eq!(chunks, vec!["Hello world. Second sentence."]);
//! ```

use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{DocqError, Result};
use crate::models::{Chunk, Page};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Number of leading characters of a chunk used to locate its page.
const PAGE_PROBE_CHARS: usize = 100;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Window size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChunkParams {
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkParams {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let params = Self { size, overlap };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(DocqError::Configuration(
                "chunk size must be > 0".to_string(),
            ));
        }
        if self.overlap >= self.size {
            return Err(DocqError::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }
}

/// Split `text` into overlapping, sentence-aware segments.
///
/// Returns an empty vector for empty text. Fails with
/// [`DocqError::Configuration`] when `overlap >= size`.
pub fn chunk_text(text: &str, params: ChunkParams) -> Result<Vec<String>> {
    params.validate()?;

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    // Byte offset of every char, plus the end of the string.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let mut end = start + params.size;

        if end < len {
            let terminator = chars[start..end]
                .iter()
                .rposition(|c| SENTENCE_TERMINATORS.contains(c))
                .map(|pos| start + pos);
            if let Some(pos) = terminator {
                if pos > start + params.size / 2 {
                    end = pos + 1;
                }
            }
        }

        let piece = text[offsets[start]..offsets[end.min(len)]].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        // Advance from the unclamped end, so a short tail window can follow.
        start = end.saturating_sub(params.overlap).max(start + 1);
    }

    Ok(chunks)
}

/// Find the page a chunk most likely came from.
///
/// Looks up the chunk's first 100 characters in each page's raw text and
/// returns the first page that contains them, or page 1 when none does.
/// Whitespace normalisation differences (e.g. a chunk spanning a page
/// break) therefore fall back to page 1.
pub fn attribute_page(chunk: &str, pages: &[Page]) -> u32 {
    let probe_end = chunk
        .char_indices()
        .nth(PAGE_PROBE_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(chunk.len());
    let probe = &chunk[..probe_end];

    pages
        .iter()
        .find(|page| page.text.contains(probe))
        .map(|page| page.number)
        .unwrap_or(1)
}

/// Chunk a document's text into [`Chunk`] records with contiguous indices.
pub fn build_chunks(
    document_id: &str,
    text: &str,
    pages: &[Page],
    params: ChunkParams,
) -> Result<Vec<Chunk>> {
    let pieces = chunk_text(text, params)?;
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| {
            let page_number = attribute_page(&piece, pages);
            make_chunk(document_id, index, piece, page_number)
        })
        .collect())
}

/// Create a single [`Chunk`] with a UUID and SHA-256 content hash.
fn make_chunk(document_id: &str, index: usize, text: String, page_number: u32) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        text,
        page_number,
        hash,
    }
}
