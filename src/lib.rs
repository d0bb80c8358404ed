//! # doc-insights
//!
//! Question answering over your own PDF and text documents.
//!
//! Documents are split into overlapping chunks, embedded into an in-memory
//! vector index and summarized. Questions retrieve the closest chunks and
//! are answered by a text-generation provider with page-level citations.
//! The engine lives in the `doc-insights-core` crate and has no network
//! code. This crate supplies the providers, file handling, report export,
//! the HTTP API and the `docq` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────┐   ┌──────────────┐
//! │ collect +   │──▶│ Session (core)        │◀──│ embedding /  │
//! │ extract     │   │ store, index, answers │   │ generation   │
//! └─────────────┘   └──────────┬───────────┘   └──────────────┘
//!                              │
//!                 ┌────────────┼────────────┐
//!                 ▼            ▼            ▼
//!            ┌────────┐   ┌────────┐   ┌────────┐
//!            │  CLI   │   │  HTTP  │   │ export │
//!            │ (docq) │   │ (axum) │   │        │
//!            └────────┘   └────────┘   └────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`collect`] | Resolve CLI paths to input files |
//! | [`extract`] | PDF and plain-text extraction |
//! | [`embedding`] | Embedding providers (OpenAI, Ollama, Gemini, local) |
//! | [`generation`] | Text-generation providers |
//! | [`export`] | Markdown, JSON and summary reports |
//! | [`progress`] | Ingestion progress on stderr |
//! | [`commands`] | One-shot CLI commands |
//! | [`chat`] | Interactive question loop |
//! | [`server`] | HTTP JSON API |

pub mod chat;
pub mod collect;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod export;
pub mod extract;
pub mod generation;
pub mod progress;
pub mod server;
