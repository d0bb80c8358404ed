//! # doc-insights core
//!
//! Network-free logic for doc-insights: data models, chunking, the
//! in-memory document store, the cosine vector index, the answer and
//! summary engines and the [`Session`](session::Session) that ties them
//! together.
//!
//! This crate has no tokio runtime, HTTP client or filesystem access.
//! Embedding, generation and text extraction arrive through the
//! [`Embedder`](embedding::Embedder), [`Generator`](generation::Generator)
//! and [`Extractor`](extract::Extractor) traits.

pub mod answer;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod models;
pub mod session;
pub mod store;
pub mod summary;

pub use error::{DocqError, Result, Service};
