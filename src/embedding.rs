//! Embedding providers.
//!
//! Concrete [`Embedder`] implementations:
//! - **[`DisabledEmbedder`]**: always fails; used when embeddings are not configured.
//! - **[`OpenAIEmbedder`]**: `POST /v1/embeddings`.
//! - **[`OllamaEmbedder`]**: `POST /api/embed` on a local Ollama instance.
//! - **[`GeminiEmbedder`]**: `batchEmbedContents` on the Generative Language API.
//! - **`LocalEmbedder`**: fastembed, behind the `local-embeddings-fastembed` feature.
//!
//! Every request is sent once. Failures (HTTP errors, timeouts, malformed
//! bodies) are returned to the caller, which decides whether to degrade.
//!
//! # Provider Selection
//!
//! ```rust
//! # use doc_insights::config::EmbeddingConfig;
//! # use doc_insights::embedding::create_embedder;
//! # use doc_insights_core::embedding::Embedder;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "disabled");
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use doc_insights_core::embedding::Embedder;

use crate::config::EmbeddingConfig;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
const DEFAULT_GEMINI_EMBEDDING_MODEL: &str = "models/embedding-001";

/// HTTP client with a request timeout. Shared by the generation providers.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Read an API key from the environment.
pub(crate) fn api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("{} environment variable not set", var),
    }
}

/// Fail with the response body for any non-2xx status.
pub(crate) async fn ensure_success(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body_text = response.text().await.unwrap_or_default();
    bail!("{} API error {}: {}", service, status, body_text)
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Embed exactly one text through a batch call.
async fn embed_one<E: Embedder + ?Sized>(embedder: &E, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed_batch(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))
}

fn json_floats(values: &serde_json::Value, what: &str) -> Result<Vec<f32>> {
    values
        .as_array()
        .ok_or_else(|| anyhow!("Invalid {} response: embedding is not an array", what))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow!("Invalid {} response: non-numeric value", what))
        })
        .collect()
}

// ============ Disabled Provider ============

/// An embedder that always fails.
///
/// Used when `embedding.provider = "disabled"`. Every document then fails
/// at the indexing step; `docq ingest --dry-run` works without a provider.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("Embedding provider is disabled")
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Requires `OPENAI_API_KEY` in the environment.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: api_key("OPENAI_API_KEY")?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.to_string()),
            base_url: trim_base(config.url.as_deref().unwrap_or(OPENAI_BASE_URL)),
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_one(self, text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        debug!(model = %self.model, count = texts.len(), "OpenAI embedding request");

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;
        let json: serde_json::Value = ensure_success("OpenAI", response).await?.json().await?;
        parse_openai_response(&json)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index`.
pub fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .ok_or_else(|| anyhow!("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(pos);
        indexed.push((index, json_floats(embedding, "OpenAI")?));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Requires Ollama to be running with the model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    model: String,
    url: String,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_EMBEDDING_MODEL.to_string()),
            url: trim_base(config.url.as_deref().unwrap_or(OLLAMA_BASE_URL)),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_one(self, text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        debug!(model = %self.model, count = texts.len(), "Ollama embedding request");

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Ollama connection error (is Ollama running at {}?)", self.url))?;
        let json: serde_json::Value = ensure_success("Ollama", response).await?.json().await?;
        parse_ollama_response(&json)
    }
}

pub fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    json.get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing embeddings array"))?
        .iter()
        .map(|embedding| json_floats(embedding, "Ollama"))
        .collect()
}

// ============ Gemini Provider ============

/// Embedding provider using Google's Generative Language API.
///
/// Requires `GEMINI_API_KEY` in the environment.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_EMBEDDING_MODEL.to_string());
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: api_key("GEMINI_API_KEY")?,
            model: gemini_model_path(&model),
            base_url: trim_base(config.url.as_deref().unwrap_or(GEMINI_BASE_URL)),
        })
    }

    fn build_request_body(&self, texts: &[String]) -> serde_json::Value {
        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                serde_json::json!({
                    "model": self.model,
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect();
        serde_json::json!({ "requests": requests })
    }
}

/// Gemini model ids are addressed as `models/<name>`.
pub(crate) fn gemini_model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_one(self, text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!(
            "{}/v1beta/{}:batchEmbedContents?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!(model = %self.model, count = texts.len(), "Gemini embedding request");

        let response = self
            .client
            .post(&url)
            .json(&self.build_request_body(texts))
            .send()
            .await
            .context("Gemini request failed")?;
        let json: serde_json::Value = ensure_success("Gemini", response).await?.json().await?;
        parse_gemini_response(&json)
    }
}

/// Extract `embeddings[].values`.
pub fn parse_gemini_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    json.get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing embeddings array"))?
        .iter()
        .map(|item| {
            let values = item
                .get("values")
                .ok_or_else(|| anyhow!("Invalid Gemini response: missing values"))?;
            json_floats(values, "Gemini")
        })
        .collect()
}

// ============ Local Provider (fastembed) ============

/// Embedding provider running a model in-process via fastembed.
///
/// The model is downloaded from Hugging Face on first use and cached;
/// afterwards no network calls are made.
#[cfg(feature = "local-embeddings-fastembed")]
pub struct LocalEmbedder {
    model_name: String,
    batch_size: usize,
    model: Arc<std::sync::Mutex<fastembed::TextEmbedding>>,
}

#[cfg(feature = "local-embeddings-fastembed")]
impl LocalEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| "all-minilm-l6-v2".to_string());
        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(config_to_fastembed_model(&model_name)?)
                .with_show_download_progress(true),
        )
        .map_err(|e| anyhow!("Failed to initialize local embedding model: {}", e))?;

        Ok(Self {
            model_name,
            batch_size: config.batch_size,
            model: Arc::new(std::sync::Mutex::new(model)),
        })
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
fn config_to_fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
        "multilingual-e5-small" => Ok(fastembed::EmbeddingModel::MultilingualE5Small),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
             nomic-embed-text-v1.5, multilingual-e5-small",
            other
        ),
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
#[async_trait]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_one(self, text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let batch_size = self.batch_size;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| anyhow!("local embedding model lock poisoned"))?;
            model
                .embed(texts, Some(batch_size))
                .map_err(|e| anyhow!("Local embedding failed: {}", e))
        })
        .await?
    }
}

/// Create the [`Embedder`] named by `config.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
/// | `"gemini"` | [`GeminiEmbedder`] |
/// | `"local"` | `LocalEmbedder` (requires `local-embeddings-fastembed`) |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => Ok(Arc::new(OpenAIEmbedder::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        "gemini" => Ok(Arc::new(GeminiEmbedder::new(config)?)),
        #[cfg(feature = "local-embeddings-fastembed")]
        "local" => Ok(Arc::new(LocalEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embeddings-fastembed"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings-fastembed"),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
