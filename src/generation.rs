//! Text generation providers.
//!
//! Concrete [`Generator`] implementations:
//! - **[`DisabledGenerator`]**: always fails. Summaries fall back and answers degrade.
//! - **[`OpenAIGenerator`]**: `POST /v1/chat/completions`.
//! - **[`OllamaGenerator`]**: `POST /api/generate` (non-streaming).
//! - **[`GeminiGenerator`]**: `generateContent`.
//!
//! Like the embedding providers, every request is sent once.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use doc_insights_core::generation::Generator;

use crate::config::GenerationConfig;
use crate::embedding::{
    api_key, ensure_success, gemini_model_path, http_client, GEMINI_BASE_URL, OLLAMA_BASE_URL,
    OPENAI_BASE_URL,
};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String> {
        bail!("Generation provider is disabled")
    }
}

// ============ OpenAI ============

/// Chat-completions generator. Requires `OPENAI_API_KEY`.
pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: api_key("OPENAI_API_KEY")?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            base_url: base(config.url.as_deref(), OPENAI_BASE_URL),
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });
        debug!(model = %self.model, "OpenAI completion request");

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;
        let json: serde_json::Value = ensure_success("OpenAI", response).await?.json().await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
    }
}

// ============ Ollama ============

pub struct OllamaGenerator {
    client: reqwest::Client,
    model: String,
    url: String,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            url: base(config.url.as_deref(), OLLAMA_BASE_URL),
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": temperature },
        });
        debug!(model = %self.model, "Ollama generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Ollama connection error (is Ollama running at {}?)", self.url))?;
        let json: serde_json::Value = ensure_success("Ollama", response).await?.json().await?;
        json["response"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid Ollama response: missing response"))
    }
}

// ============ Gemini ============

/// `generateContent` generator. Requires `GEMINI_API_KEY`.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: api_key("GEMINI_API_KEY")?,
            model: gemini_model_path(&model),
            base_url: base(config.url.as_deref(), GEMINI_BASE_URL),
        })
    }
}

/// Request body for the Gemini `generateContent` API.
pub fn gemini_request_body(prompt: &str, temperature: f32) -> serde_json::Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
        "generationConfig": { "temperature": temperature },
    })
}

/// Text of `candidates[0].content.parts[0]`.
pub fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing candidates[0].content.parts[0].text"))
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!(
            "{}/v1beta/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!(model = %self.model, "Gemini generate request");

        let response = self
            .client
            .post(&url)
            .json(&gemini_request_body(prompt, temperature))
            .send()
            .await
            .context("Gemini request failed")?;
        let json: serde_json::Value = ensure_success("Gemini", response).await?.json().await?;
        parse_gemini_response(&json)
    }
}

fn base(url: Option<&str>, default: &str) -> String {
    url.unwrap_or(default).trim_end_matches('/').to_string()
}

/// Create the [`Generator`] named by `config.provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "openai" => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        "gemini" => Ok(Arc::new(GeminiGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}
