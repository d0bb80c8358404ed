//! Retrieval-augmented answering.
//!
//! [`AnswerEngine::answer`] retrieves the top-k chunks, injects them as
//! context ahead of the question, calls the generator and decorates the
//! reply with citations, per-source details, a confidence heuristic and
//! key phrases.
//!
//! Failure policy:
//! - empty index: [`DocqError::NoDocuments`]
//! - inconsistent vector dimensions: [`DocqError::DimensionMismatch`]
//! - any embedding or generation failure: a degraded [`AnswerResult`]
//!   whose `answer` describes the error and whose other fields are empty.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{DocqError, Result, Service};
use crate::generation::Generator;
use crate::index::{RetrievedChunk, VectorIndex, DEFAULT_TOP_K};
use crate::models::{AnswerResult, SourceInfo};
use crate::store::DocumentStore;

pub const DEFAULT_ANSWER_TEMPERATURE: f32 = 0.7;

/// Characters of chunk text kept in a source preview.
const PREVIEW_CHARS: usize = 200;

const KEY_PHRASE_WORDS: [&str; 6] = [
    "important",
    "key",
    "significant",
    "main",
    "primary",
    "essential",
];
const MAX_KEY_PHRASES: usize = 3;

pub struct AnswerEngine {
    generator: Arc<dyn Generator>,
    temperature: f32,
    top_k: usize,
}

impl AnswerEngine {
    pub fn new(generator: Arc<dyn Generator>, temperature: f32, top_k: usize) -> Self {
        Self {
            generator,
            temperature,
            top_k: if top_k == 0 { DEFAULT_TOP_K } else { top_k },
        }
    }

    pub async fn answer(
        &self,
        question: &str,
        index: &VectorIndex,
        store: &DocumentStore,
    ) -> Result<AnswerResult> {
        if index.is_empty() {
            return Err(DocqError::NoDocuments);
        }

        let retrieved = match index.query(question, self.top_k, store).await {
            Ok(retrieved) => retrieved,
            Err(e @ DocqError::DimensionMismatch { .. }) => return Err(e),
            Err(e) => return Ok(degraded(e)),
        };
        debug!(sources = retrieved.len(), "retrieved context");

        let prompt = build_prompt(question, &retrieved);
        let answer = match self.generator.generate(&prompt, self.temperature).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                return Ok(degraded(DocqError::external(Service::Generation, e)));
            }
        };

        let sources_info = source_info(&retrieved);
        let citations = join_citations(&sources_info);
        let lengths: Vec<usize> = retrieved.iter().map(|r| r.chunk.text.chars().count()).collect();

        Ok(AnswerResult {
            key_phrases: extract_key_phrases(&answer),
            answer,
            citations,
            sources_info,
            confidence: confidence_score(&lengths),
        })
    }
}

fn degraded(err: DocqError) -> AnswerResult {
    warn!(error = %err, "answer degraded");
    AnswerResult::degraded(format!("Error generating response: {}", err))
}

/// Grounded QA prompt. Retrieved context always precedes the question.
pub fn build_prompt(question: &str, retrieved: &[RetrievedChunk]) -> String {
    let context = retrieved
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "You are a helpful assistant that answers questions based on the provided document context.\n\
         Always provide specific, accurate answers and mention which document(s) you're referencing when possible.\n\n\
         Context: {}\n\n\
         Question: {}\n\n\
         Answer with specific details and cite the source document(s) when relevant:",
        context, question
    )
}

/// `"<filename> (Page <n>)"` entries, deduplicated by (filename, page) in
/// first-seen order and joined with `"; "`.
pub fn format_citations(retrieved: &[RetrievedChunk]) -> String {
    join_citations(&source_info(retrieved))
}

fn join_citations(sources: &[SourceInfo]) -> String {
    sources
        .iter()
        .map(SourceInfo::citation)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One [`SourceInfo`] per distinct (filename, page), first-seen order.
pub fn source_info(retrieved: &[RetrievedChunk]) -> Vec<SourceInfo> {
    let mut seen = HashSet::new();
    retrieved
        .iter()
        .filter(|r| seen.insert((r.filename.as_str(), r.chunk.page_number)))
        .map(|r| SourceInfo {
            filename: r.filename.clone(),
            page_number: r.chunk.page_number,
            chunk_index: r.chunk.chunk_index,
            file_type: r.file_type,
            content_preview: preview(&r.chunk.text),
        })
        .collect()
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_string(),
    }
}

/// `min(1, 0.2 * n + 0.3 * avg_len / 1000)` rounded to 2 decimals.
///
/// `lengths` are the character lengths of every retrieved chunk. This is a
/// ranking heuristic, not a probability.
pub fn confidence_score(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    let n = lengths.len() as f64;
    let avg = lengths.iter().sum::<usize>() as f64 / n;
    let raw = (0.2 * n + 0.3 * (avg / 1000.0)).min(1.0);
    (raw * 100.0).round() / 100.0
}

/// Up to three answer sentences that mention a salient keyword.
///
/// Sentences come from splitting on `.`; a kept sentence is 21 to 149
/// characters long after trimming.
pub fn extract_key_phrases(answer: &str) -> Vec<String> {
    answer
        .split('.')
        .map(str::trim)
        .filter(|s| {
            let len = s.chars().count();
            len > 20 && len < 150
        })
        .filter(|s| {
            let lower = s.to_lowercase();
            KEY_PHRASE_WORDS.iter().any(|w| lower.contains(w))
        })
        .take(MAX_KEY_PHRASES)
        .map(str::to_string)
        .collect()
}
