//! Text generation service trait.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for large-language-model backends.
///
/// Failures (timeouts, quota, malformed input) are all treated the same
/// way by the engines: summaries fall back to fixed text and answers are
/// degraded, nothing is retried.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-1.5-flash"`).
    fn model_name(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;
}
