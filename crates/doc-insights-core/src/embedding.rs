//! Embedding service trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that all embedding backends implement,
//! plus [`cosine_similarity`], the metric used by the vector index.
//!
//! Concrete providers (OpenAI, Ollama, Gemini, fastembed) live in the
//! `doc-insights` app crate. Tests substitute deterministic fakes.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding providers.
///
/// Every call is a single, blocking-from-the-caller's-view request: no
/// retries. Implementations must produce vectors of one fixed
/// dimensionality per model; the index rejects anything else.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input in input order.
    ///
    /// The default implementation calls [`embed`](Embedder::embed) for each
    /// text in turn; providers with a batch endpoint override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, zero vectors, or vectors of different
/// lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
