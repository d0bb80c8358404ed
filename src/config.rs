//! TOML configuration.
//!
//! Every section and field has a default, so `docq` runs without a config
//! file. API keys never live in the file; they come from `OPENAI_API_KEY`
//! and `GEMINI_API_KEY` (a `.env` file is honoured at startup).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use doc_insights_core::chunk::{ChunkParams, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use doc_insights_core::session::SessionConfig;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override (e.g. a proxy or a remote Ollama host).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: None,
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f32,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: None,
            answer_temperature: 0.7,
            summary_temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

fn default_answer_temperature() -> f32 {
    0.7
}
fn default_summary_temperature() -> f32 {
    0.3
}
fn default_generation_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string(), "**/*.txt".to_string()]
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Engine parameters for a new [`Session`](doc_insights_core::session::Session).
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            chunk: ChunkParams {
                size: self.chunking.size,
                overlap: self.chunking.overlap,
            },
            top_k: self.retrieval.top_k,
            embed_batch_size: self.embedding.batch_size,
            answer_temperature: self.generation.answer_temperature,
            summary_temperature: self.generation.summary_temperature,
        }
    }
}

/// Load and validate a config file. `None` yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            parse_config(&content)
        }
        None => Ok(Config::default()),
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.size == 0 {
        anyhow::bail!("chunking.size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.size {
        anyhow::bail!(
            "chunking.overlap ({}) must be smaller than chunking.size ({})",
            config.chunking.overlap,
            config.chunking.size
        );
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    for (name, value) in [
        ("generation.answer_temperature", config.generation.answer_temperature),
        ("generation.summary_temperature", config.generation.summary_temperature),
    ] {
        if !(0.0..=2.0).contains(&value) {
            anyhow::bail!("{} must be in [0.0, 2.0]", name);
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "gemini" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, gemini, or local.",
            other
        ),
    }

    match config.generation.provider.as_str() {
        "disabled" | "openai" | "ollama" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled, openai, ollama, or gemini.",
            other
        ),
    }

    if config.ingest.include_globs.is_empty() {
        anyhow::bail!("ingest.include_globs must not be empty");
    }

    Ok(())
}
