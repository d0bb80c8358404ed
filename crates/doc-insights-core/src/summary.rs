//! Per-document and cross-document summaries.
//!
//! Summaries never fail: generator errors are logged and replaced with a
//! fixed fallback (per document) or an error description (executive).

use std::sync::Arc;

use tracing::warn;

use crate::generation::Generator;
use crate::models::Document;

/// Stored as a document's summary when the generator fails.
pub const SUMMARY_FALLBACK: &str =
    "Summary generation failed - document content available for querying.";

/// Executive summary when nothing has been ingested.
pub const NO_DOCUMENTS_SUMMARY: &str = "No documents loaded for summary generation.";

/// Length of the text prefix handed to the document summarizer.
pub const SUMMARY_SAMPLE_CHARS: usize = 3000;

pub const DEFAULT_SUMMARY_TEMPERATURE: f32 = 0.3;

pub struct SummaryEngine {
    generator: Arc<dyn Generator>,
    temperature: f32,
}

impl SummaryEngine {
    pub fn new(generator: Arc<dyn Generator>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// Summarize a text sample in 3-4 sentences.
    pub async fn document_summary(&self, text_sample: &str) -> String {
        let prompt = document_prompt(text_sample);
        match self.generator.generate(&prompt, self.temperature).await {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "document summary failed, using fallback");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    /// Combine the stored summaries of `documents`.
    ///
    /// One document returns its summary unchanged; two or more are
    /// synthesized by the generator.
    pub async fn executive_summary(&self, documents: &[Document]) -> String {
        match documents {
            [] => NO_DOCUMENTS_SUMMARY.to_string(),
            [only] => only.summary.clone(),
            many => {
                let prompt = executive_prompt(many);
                match self.generator.generate(&prompt, self.temperature).await {
                    Ok(summary) => summary.trim().to_string(),
                    Err(e) => {
                        warn!(error = %format!("{:#}", e), "executive summary failed");
                        format!("Error generating executive summary: {:#}", e)
                    }
                }
            }
        }
    }
}

/// First [`SUMMARY_SAMPLE_CHARS`] characters of `text`.
pub fn summary_sample(text: &str) -> &str {
    match text.char_indices().nth(SUMMARY_SAMPLE_CHARS) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

fn document_prompt(text_sample: &str) -> String {
    format!(
        "Generate a concise executive summary (3-4 sentences) of the following document content:\n\n{}\n\nSummary:",
        text_sample
    )
}

fn executive_prompt(documents: &[Document]) -> String {
    let summaries: Vec<String> = documents
        .iter()
        .map(|d| format!("**{}**: {}", d.filename, d.summary))
        .collect();
    format!(
        "Create a comprehensive executive summary combining the following individual document summaries:\n\n{}\n\nProvide a unified executive summary highlighting key themes and insights across all documents:",
        summaries.join("\n")
    )
}
