//! Text extraction for uploaded files (PDF and plain text).
//!
//! [`FileExtractor`] implements the core [`Extractor`] trait. PDFs go
//! through `pdf-extract`; pages are separated on form feeds (`\x0C`) and
//! fall back to a single page when the output has none. Plain text is
//! decoded as UTF-8, replacing invalid sequences, and forms one page.

use tracing::{debug, warn};

use doc_insights_core::error::{DocqError, Result};
use doc_insights_core::extract::Extractor;
use doc_insights_core::models::{ExtractedText, FileType, Page};

const PAGE_BREAK: char = '\x0C';

#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;

impl Extractor for FileExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
        match FileType::from_filename(filename)? {
            FileType::Pdf => extract_pdf(filename, bytes),
            FileType::Txt => Ok(extract_txt(bytes)),
        }
    }
}

/// A PDF that cannot be parsed yields no text, reported as
/// [`DocqError::EmptyContent`].
fn extract_pdf(filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        warn!(filename, error = %e, "PDF extraction failed");
        DocqError::EmptyContent(filename.to_string())
    })?;

    let pages = split_pages(&raw);
    debug!(filename, pages = pages.len(), "PDF extracted");
    Ok(ExtractedText {
        file_type: FileType::Pdf,
        text: raw.replace(PAGE_BREAK, "\n"),
        pages,
    })
}

fn extract_txt(bytes: &[u8]) -> ExtractedText {
    let text = String::from_utf8_lossy(bytes).into_owned();
    ExtractedText {
        file_type: FileType::Txt,
        pages: vec![Page {
            number: 1,
            text: text.clone(),
        }],
        text,
    }
}

/// Split extractor output on form feeds. Blank pages are skipped but keep
/// their position in the numbering.
pub fn split_pages(raw: &str) -> Vec<Page> {
    if !raw.contains(PAGE_BREAK) {
        return vec![Page {
            number: 1,
            text: raw.to_string(),
        }];
    }
    raw.split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Page {
            number: i as u32 + 1,
            text: text.to_string(),
        })
        .collect()
}
