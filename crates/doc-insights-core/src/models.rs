//! Core data models used throughout doc-insights.
//!
//! These types represent the documents, chunks, answers and conversation
//! turns that flow through the ingestion and question-answering pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocqError, Result};

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
}

impl FileType {
    /// Resolve the file type from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Err(DocqError::UnsupportedFileType(filename.to_string())),
        };
        match ext.as_str() {
            "pdf" => Ok(FileType::Pdf),
            "txt" => Ok(FileType::Txt),
            _ => Err(DocqError::UnsupportedFileType(format!(".{}", ext))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw text of one page as extracted at load time (1-based numbering).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

/// Output of the text extraction collaborator.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub file_type: FileType,
    /// Full document text.
    pub text: String,
    /// Per-page raw text pools used for page attribution.
    pub pages: Vec<Page>,
}

/// An uploaded file, before extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A document ready to be added to the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub file_type: FileType,
    pub text: String,
    pub pages: Vec<Page>,
}

impl NewDocument {
    pub fn from_extracted(filename: impl Into<String>, extracted: ExtractedText) -> Self {
        Self {
            filename: filename.into(),
            file_type: extracted.file_type,
            text: extracted.text,
            pages: extracted.pages,
        }
    }

    /// Plain-text document with a single page.
    pub fn plain_text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            filename: filename.into(),
            file_type: FileType::Txt,
            pages: vec![Page {
                number: 1,
                text: text.clone(),
            }],
            text,
        }
    }
}

/// One ingested file. Only `summary` changes after creation.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub upload_time: DateTime<Utc>,
    #[serde(rename = "page_map")]
    pub pages: Vec<Page>,
    /// Full extracted text as ingested. Not exported.
    #[serde(skip)]
    pub text: String,
    pub summary: String,
    pub chunk_count: usize,
}

/// A contiguous slice of a document's text used as a retrieval unit.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    /// Best-effort page attribution, defaults to 1.
    pub page_number: u32,
    /// SHA-256 of `text`.
    pub hash: String,
}

/// Per-source detail attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    pub filename: String,
    pub page_number: u32,
    pub chunk_index: usize,
    pub file_type: FileType,
    pub content_preview: String,
}

impl SourceInfo {
    /// `"<filename> (Page <n>)"`.
    pub fn citation(&self) -> String {
        format!("{} (Page {})", self.filename, self.page_number)
    }
}

/// Structured result of a question.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    /// `"<filename> (Page <n>)"` entries joined with `"; "`.
    pub citations: String,
    pub sources_info: Vec<SourceInfo>,
    /// Heuristic in `[0.0, 1.0]`; not a calibrated probability.
    pub confidence: f64,
    pub key_phrases: Vec<String>,
}

impl AnswerResult {
    /// Well-formed result carrying only an error description.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            answer: message.into(),
            ..Self::default()
        }
    }

    /// Citation entries in first-seen order.
    ///
    /// `sources_info` shares the citation dedup key, so each entry maps to
    /// exactly one citation.
    pub fn citation_list(&self) -> Vec<String> {
        self.sources_info.iter().map(SourceInfo::citation).collect()
    }
}

/// One question/answer exchange in the conversation log.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub citations: Vec<String>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_extension() {
        assert_eq!(FileType::from_filename("report.PDF").unwrap(), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.txt").unwrap(), FileType::Txt);
        assert!(matches!(
            FileType::from_filename("slides.pptx"),
            Err(DocqError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            FileType::from_filename("README"),
            Err(DocqError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn citation_list_follows_sources() {
        let source = |name: &str, page| SourceInfo {
            filename: name.to_string(),
            page_number: page,
            chunk_index: 0,
            file_type: FileType::Pdf,
            content_preview: String::new(),
        };
        let result = AnswerResult {
            sources_info: vec![source("a; b.pdf", 1), source("c.pdf", 2)],
            ..AnswerResult::default()
        };
        assert_eq!(result.citation_list(), vec!["a; b.pdf (Page 1)", "c.pdf (Page 2)"]);
        assert!(AnswerResult::degraded("boom").citation_list().is_empty());
    }
}
