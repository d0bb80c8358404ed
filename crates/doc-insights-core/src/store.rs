//! In-memory document store.
//!
//! Exclusively owns [`Document`]s and their [`Chunk`]s. Documents keep
//! insertion order, which the index uses as its final tie-break and the
//! summary engine uses to order executive-summary input.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::chunk::{build_chunks, ChunkParams};
use crate::error::{DocqError, Result};
use crate::models::{Chunk, Document, NewDocument};
use crate::summary::{summary_sample, SummaryEngine};

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    /// Document count per file type (`"pdf"`, `"txt"`).
    pub file_types: BTreeMap<String, usize>,
}

pub struct DocumentStore {
    params: ChunkParams,
    documents: Vec<Document>,
    chunks: HashMap<String, Chunk>,
    /// Document id -> chunk ids in `chunk_index` order.
    chunk_ids: HashMap<String, Vec<String>>,
}

impl DocumentStore {
    pub fn new(params: ChunkParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            documents: Vec::new(),
            chunks: HashMap::new(),
            chunk_ids: HashMap::new(),
        })
    }

    /// Chunk a document, summarize its first 3000 characters and keep both.
    ///
    /// Fails with [`DocqError::EmptyContent`] when the text is blank after
    /// trimming. Summarizer failures never propagate; the fallback summary
    /// is stored instead.
    pub async fn add(
        &mut self,
        new: NewDocument,
        summarizer: &SummaryEngine,
    ) -> Result<(Document, Vec<Chunk>)> {
        if new.text.trim().is_empty() {
            return Err(DocqError::EmptyContent(new.filename));
        }

        let id = Uuid::new_v4().to_string();
        let chunks = build_chunks(&id, &new.text, &new.pages, self.params)?;
        if chunks.is_empty() {
            return Err(DocqError::EmptyContent(new.filename));
        }
        let summary = summarizer.document_summary(summary_sample(&new.text)).await;

        let document = Document {
            id: id.clone(),
            filename: new.filename,
            file_type: new.file_type,
            upload_time: chrono::Utc::now(),
            pages: new.pages,
            text: new.text,
            summary,
            chunk_count: chunks.len(),
        };

        self.chunk_ids
            .insert(id, chunks.iter().map(|c| c.id.clone()).collect());
        for chunk in &chunks {
            self.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        self.documents.push(document.clone());

        info!(
            filename = %document.filename,
            chunks = document.chunk_count,
            "document stored"
        );
        Ok((document, chunks))
    }

    /// Remove one document and its chunks.
    pub fn remove(&mut self, document_id: &str) -> Option<Document> {
        let pos = self.documents.iter().position(|d| d.id == document_id)?;
        let document = self.documents.remove(pos);
        for chunk_id in self.chunk_ids.remove(document_id).unwrap_or_default() {
            self.chunks.remove(&chunk_id);
        }
        Some(document)
    }

    /// Drop every document and chunk. Index entries are cleared by the
    /// owner of the index alongside this call.
    pub fn remove_all(&mut self) {
        self.documents.clear();
        self.chunks.clear();
        self.chunk_ids.clear();
    }

    pub fn stats(&self) -> StoreStats {
        let mut file_types = BTreeMap::new();
        for doc in &self.documents {
            *file_types.entry(doc.file_type.as_str().to_string()).or_insert(0) += 1;
        }
        StoreStats {
            total_documents: self.documents.len(),
            total_chunks: self.chunks.len(),
            file_types,
        }
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, document_id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == document_id)
    }

    pub fn chunk(&self, chunk_id: &str) -> Option<&Chunk> {
        self.chunks.get(chunk_id)
    }

    /// A document's chunks ordered by `chunk_index`.
    pub fn chunks_of(&self, document_id: &str) -> Vec<&Chunk> {
        self.chunk_ids
            .get(document_id)
            .map(|ids| ids.iter().filter_map(|id| self.chunks.get(id)).collect())
            .unwrap_or_default()
    }

    /// Replace a document's summary. Returns `false` for unknown ids.
    pub fn set_summary(&mut self, document_id: &str, summary: String) -> bool {
        match self.documents.iter_mut().find(|d| d.id == document_id) {
            Some(doc) => {
                doc.summary = summary;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
