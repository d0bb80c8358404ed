//! Brute-force cosine vector index.
//!
//! Holds one embedding vector per indexed chunk, keyed by chunk id. Chunk
//! content stays in the [`DocumentStore`]; queries resolve ids back through
//! it.
//!
//! Builds are atomic per call: every chunk of the batch is embedded into a
//! staging area first and nothing is committed unless all vectors arrived
//! and share the index dimensionality.
//!
//! Results are ordered by score (descending), then `chunk_index`
//! (ascending), then document insertion order, so equal scores come back
//! in a stable order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{DocqError, Result, Service};
use crate::models::{Chunk, FileType};
use crate::store::DocumentStore;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 64;

struct IndexEntry {
    chunk_id: String,
    document_id: String,
    doc_order: usize,
    chunk_index: usize,
    vector: Vec<f32>,
}

/// A chunk returned by [`VectorIndex::query`] with its source metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub filename: String,
    pub file_type: FileType,
    pub score: f32,
}

pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    entries: Vec<IndexEntry>,
    dims: Option<usize>,
    doc_order: HashMap<String, usize>,
    next_order: usize,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            entries: Vec::new(),
            dims: None,
            doc_order: HashMap::new(),
            next_order: 0,
        }
    }

    /// Embed and index `chunks`. On any failure the index is unchanged.
    pub async fn build(&mut self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut dims = self.dims;
        let mut staged: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self
                .embedder
                .embed_batch(&texts)
                .await
                .map_err(|e| DocqError::external(Service::Embedding, e))?;

            if vectors.len() != batch.len() {
                return Err(DocqError::ExternalService {
                    service: Service::Embedding,
                    message: format!(
                        "expected {} vectors, got {}",
                        batch.len(),
                        vectors.len()
                    ),
                });
            }

            for vector in vectors {
                if vector.is_empty() {
                    return Err(DocqError::ExternalService {
                        service: Service::Embedding,
                        message: "empty embedding vector".to_string(),
                    });
                }
                match dims {
                    Some(expected) if expected != vector.len() => {
                        return Err(DocqError::DimensionMismatch {
                            expected,
                            actual: vector.len(),
                        });
                    }
                    Some(_) => {}
                    None => dims = Some(vector.len()),
                }
                staged.push(vector);
            }
        }

        self.dims = dims;
        for (chunk, vector) in chunks.iter().zip(staged) {
            let doc_order = self.order_of(&chunk.document_id);
            self.entries.push(IndexEntry {
                chunk_id: chunk.id.clone(),
                document_id: chunk.document_id.clone(),
                doc_order,
                chunk_index: chunk.chunk_index,
                vector,
            });
        }

        info!(
            chunks = chunks.len(),
            total = self.entries.len(),
            model = self.embedder.model_name(),
            "index batch committed"
        );
        Ok(())
    }

    /// Return the `k` chunks most similar to `text`.
    ///
    /// An empty index yields an empty result without calling the embedder.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        store: &DocumentStore,
    ) -> Result<Vec<RetrievedChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| DocqError::external(Service::Embedding, e))?;

        if let Some(expected) = self.dims {
            if query_vec.len() != expected {
                return Err(DocqError::DimensionMismatch {
                    expected,
                    actual: query_vec.len(),
                });
            }
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query_vec, &entry.vector), entry))
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then(a.chunk_index.cmp(&b.chunk_index))
                .then(a.doc_order.cmp(&b.doc_order))
        });

        let results: Vec<RetrievedChunk> = scored
            .into_iter()
            .filter_map(|(score, entry)| {
                let chunk = store.chunk(&entry.chunk_id)?;
                let doc = store.document(&entry.document_id)?;
                Some(RetrievedChunk {
                    chunk: chunk.clone(),
                    filename: doc.filename.clone(),
                    file_type: doc.file_type,
                    score,
                })
            })
            .take(k)
            .collect();

        debug!(
            query_len = text.len(),
            scores = ?results.iter().map(|r| r.score).collect::<Vec<_>>(),
            "index query"
        );
        Ok(results)
    }

    /// Drop every entry of one document. Returns the number removed.
    pub fn remove_document(&mut self, document_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.document_id != document_id);
        self.doc_order.remove(document_id);
        if self.entries.is_empty() {
            self.dims = None;
        }
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.doc_order.clear();
        self.dims = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality shared by every stored vector.
    pub fn dims(&self) -> Option<usize> {
        self.dims
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    fn order_of(&mut self, document_id: &str) -> usize {
        if let Some(order) = self.doc_order.get(document_id) {
            return *order;
        }
        let order = self.next_order;
        self.next_order += 1;
        self.doc_order.insert(document_id.to_string(), order);
        order
    }
}
