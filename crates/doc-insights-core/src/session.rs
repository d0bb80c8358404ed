//! Session: the explicit context object tying the pipeline together.
//!
//! A [`Session`] owns the document store, the vector index, the
//! conversation log and the current executive summary. Embedding and
//! generation services are injected at construction, so tests and the
//! CLI/server can swap implementations freely.
//!
//! All mutation goes through `&mut self`; callers sharing a session across
//! tasks wrap it in a mutex.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::answer::{AnswerEngine, DEFAULT_ANSWER_TEMPERATURE};
use crate::chunk::ChunkParams;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::extract::Extractor;
use crate::generation::Generator;
use crate::index::{VectorIndex, DEFAULT_EMBED_BATCH_SIZE, DEFAULT_TOP_K};
use crate::models::{AnswerResult, ConversationTurn, Document, NewDocument, SourceFile};
use crate::store::{DocumentStore, StoreStats};
use crate::summary::{
    summary_sample, SummaryEngine, DEFAULT_SUMMARY_TEMPERATURE, NO_DOCUMENTS_SUMMARY,
};

/// Engine parameters. The app crate fills this from its config file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub chunk: ChunkParams,
    pub top_k: usize,
    pub embed_batch_size: usize,
    pub answer_temperature: f32,
    pub summary_temperature: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkParams::default(),
            top_k: DEFAULT_TOP_K,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            answer_temperature: DEFAULT_ANSWER_TEMPERATURE,
            summary_temperature: DEFAULT_SUMMARY_TEMPERATURE,
        }
    }
}

/// One file of a batch that could not be ingested.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub filename: String,
    pub code: String,
    pub message: String,
}

/// Outcome of [`Session::ingest_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: Vec<Document>,
    pub failed: Vec<FileFailure>,
    pub message: String,
}

impl BatchReport {
    fn new(total: usize, succeeded: Vec<Document>, failed: Vec<FileFailure>) -> Self {
        let message = if succeeded.is_empty() {
            "Failed to process any documents.".to_string()
        } else {
            format!(
                "Processed {}/{} documents successfully.",
                succeeded.len(),
                total
            )
        };
        Self {
            total,
            succeeded,
            failed,
            message,
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    #[serde(flatten)]
    pub store: StoreStats,
    /// Filenames in ingestion order.
    pub document_list: Vec<String>,
    pub indexed_chunks: usize,
    pub conversation_turns: usize,
}

/// Read-only view consumed by the report renderers.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub conversation_log: Vec<ConversationTurn>,
    pub document_metadata: Vec<Document>,
    pub executive_summary: String,
}

pub struct Session {
    store: DocumentStore,
    index: VectorIndex,
    answers: AnswerEngine,
    summaries: SummaryEngine,
    conversation: Vec<ConversationTurn>,
    executive_summary: String,
}

impl Session {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: SessionConfig,
    ) -> Result<Self> {
        Ok(Self {
            store: DocumentStore::new(config.chunk)?,
            index: VectorIndex::new(embedder, config.embed_batch_size),
            answers: AnswerEngine::new(
                generator.clone(),
                config.answer_temperature,
                config.top_k,
            ),
            summaries: SummaryEngine::new(generator, config.summary_temperature),
            conversation: Vec::new(),
            executive_summary: NO_DOCUMENTS_SUMMARY.to_string(),
        })
    }

    /// Chunk, store, summarize and index one document.
    ///
    /// If indexing fails the document is removed from the store again, so
    /// the store never holds chunks missing from the index.
    pub async fn ingest(&mut self, document: NewDocument) -> Result<Document> {
        let (document, chunks) = self.store.add(document, &self.summaries).await?;
        if let Err(e) = self.index.build(&chunks).await {
            self.store.remove(&document.id);
            return Err(e);
        }
        info!(filename = %document.filename, chunks = chunks.len(), "document ingested");
        Ok(document)
    }

    /// Extract and ingest every file; one bad file never aborts the rest.
    ///
    /// The executive summary is refreshed once if anything succeeded.
    pub async fn ingest_batch(
        &mut self,
        extractor: &dyn Extractor,
        files: Vec<SourceFile>,
    ) -> BatchReport {
        self.ingest_batch_observed(extractor, files, &mut |_, _, _| {})
            .await
    }

    /// [`ingest_batch`](Self::ingest_batch) that calls `on_file(n, total,
    /// filename)` before each file is processed (`n` is 1-based).
    pub async fn ingest_batch_observed(
        &mut self,
        extractor: &dyn Extractor,
        files: Vec<SourceFile>,
        on_file: &mut (dyn FnMut(usize, usize, &str) + Send),
    ) -> BatchReport {
        let total = files.len();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (i, file) in files.into_iter().enumerate() {
            on_file(i + 1, total, &file.filename);
            let outcome = match extractor.extract(&file.filename, &file.bytes) {
                Ok(extracted) => {
                    self.ingest(NewDocument::from_extracted(file.filename.clone(), extracted))
                        .await
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok(doc) => succeeded.push(doc),
                Err(e) => {
                    warn!(filename = %file.filename, error = %e, "ingestion failed");
                    failed.push(FileFailure {
                        filename: file.filename,
                        code: e.code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if !succeeded.is_empty() {
            self.refresh_executive_summary().await;
        }

        let report = BatchReport::new(total, succeeded, failed);
        info!("{}", report.message);
        report
    }

    /// Answer a question and log the exchange.
    ///
    /// Degraded answers are logged too. `NoDocuments` and
    /// `DimensionMismatch` are returned as errors and leave the log as is.
    pub async fn ask(&mut self, question: &str) -> Result<AnswerResult> {
        let result = self
            .answers
            .answer(question, &self.index, &self.store)
            .await?;
        self.conversation.push(ConversationTurn {
            question: question.to_string(),
            answer: result.answer.clone(),
            citations: result.citation_list(),
            confidence: result.confidence,
            timestamp: Utc::now(),
        });
        Ok(result)
    }

    /// Re-run the summarizer for one document over the same text sample
    /// used at ingestion. `None` for unknown ids.
    pub async fn regenerate_summary(&mut self, document_id: &str) -> Option<String> {
        let document = self.store.document(document_id)?;
        let summary = self
            .summaries
            .document_summary(summary_sample(&document.text))
            .await;
        self.store.set_summary(document_id, summary.clone());
        Some(summary)
    }

    pub async fn refresh_executive_summary(&mut self) -> &str {
        self.executive_summary = self
            .summaries
            .executive_summary(self.store.documents())
            .await;
        &self.executive_summary
    }

    pub fn executive_summary(&self) -> &str {
        &self.executive_summary
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
    }

    /// Drop documents, chunks, index entries, conversation and summary.
    pub fn clear_all(&mut self) {
        self.store.remove_all();
        self.index.clear();
        self.conversation.clear();
        self.executive_summary = NO_DOCUMENTS_SUMMARY.to_string();
        info!("session cleared");
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            store: self.store.stats(),
            document_list: self
                .store
                .documents()
                .iter()
                .map(|d| d.filename.clone())
                .collect(),
            indexed_chunks: self.index.len(),
            conversation_turns: self.conversation.len(),
        }
    }

    pub fn report(&self) -> Report {
        Report {
            conversation_log: self.conversation.clone(),
            document_metadata: self.store.documents().to_vec(),
            executive_summary: self.executive_summary.clone(),
        }
    }

    pub fn documents(&self) -> &[Document] {
        self.store.documents()
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocqError;
    use crate::models::{ExtractedText, FileType, Page};
    use anyhow::{anyhow, Result as AnyResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Bag-of-words over a tiny vocabulary.
    struct VocabEmbedder {
        fail: AtomicBool,
    }

    const VOCAB: [&str; 4] = ["apple", "pear", "tax", "river"];

    #[async_trait]
    impl Embedder for VocabEmbedder {
        fn model_name(&self) -> &str {
            "vocab"
        }
        async fn embed(&self, text: &str) -> AnyResult<Vec<f32>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("embedding backend down"));
            }
            let lower = text.to_lowercase();
            let mut v: Vec<f32> = VOCAB.iter().map(|w| lower.matches(w).count() as f32).collect();
            v.push(0.01);
            Ok(v)
        }
    }

    struct FixedGen(&'static str);

    #[async_trait]
    impl Generator for FixedGen {
        fn model_name(&self) -> &str {
            "fixed"
        }
        async fn generate(&self, _prompt: &str, _t: f32) -> AnyResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct TxtOnly;

    impl Extractor for TxtOnly {
        fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
            let file_type = FileType::from_filename(filename)?;
            let text = String::from_utf8_lossy(bytes).to_string();
            Ok(ExtractedText {
                file_type,
                pages: vec![Page { number: 1, text: text.clone() }],
                text,
            })
        }
    }

    fn session() -> (Session, Arc<VocabEmbedder>) {
        let embedder = Arc::new(VocabEmbedder { fail: AtomicBool::new(false) });
        let session = Session::new(
            embedder.clone(),
            Arc::new(FixedGen("The main point is about apples and pears.")),
            SessionConfig::default(),
        )
        .unwrap();
        (session, embedder)
    }

    fn file(name: &str, text: &str) -> SourceFile {
        SourceFile { filename: name.to_string(), bytes: text.as_bytes().to_vec() }
    }

    #[tokio::test]
    async fn batch_isolates_bad_files() {
        let (mut session, _) = session();
        let report = session
            .ingest_batch(
                &TxtOnly,
                vec![
                    file("apples.txt", "Apple orchards need care."),
                    file("deck.pptx", "slides"),
                    file("rivers.txt", "The river floods in spring."),
                ],
            )
            .await;

        assert_eq!(report.message, "Processed 2/3 documents successfully.");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].code, "unsupported_file_type");
        assert_eq!(session.stats().document_list, vec!["apples.txt", "rivers.txt"]);
        assert_ne!(session.executive_summary(), NO_DOCUMENTS_SUMMARY);

        let result = session.ask("Where does the river flood?").await.unwrap();
        assert!(result.citations.starts_with("rivers.txt (Page 1)"));
    }

    #[tokio::test]
    async fn batch_reports_progress() {
        let (mut session, _) = session();
        let mut seen = Vec::new();
        session
            .ingest_batch_observed(
                &TxtOnly,
                vec![file("a.txt", "Apple."), file("b.txt", "Pear.")],
                &mut |n, total, name| seen.push(format!("{}/{} {}", n, total, name)),
            )
            .await;
        assert_eq!(seen, vec!["1/2 a.txt", "2/2 b.txt"]);
    }

    #[tokio::test]
    async fn batch_with_no_success() {
        let (mut session, _) = session();
        let report = session
            .ingest_batch(&TxtOnly, vec![file("a.doc", "x"), file("b.txt", "   ")])
            .await;
        assert_eq!(report.message, "Failed to process any documents.");
        assert_eq!(report.failed[1].code, "empty_content");
        assert_eq!(session.executive_summary(), NO_DOCUMENTS_SUMMARY);
    }

    #[tokio::test]
    async fn index_failure_rolls_back_store() {
        let (mut session, embedder) = session();
        embedder.fail.store(true, Ordering::SeqCst);
        let err = session
            .ingest(NewDocument::plain_text("a.txt", "Apple text."))
            .await
            .unwrap_err();
        assert!(matches!(err, DocqError::ExternalService { .. }));
        assert_eq!(session.stats().store.total_documents, 0);
        assert_eq!(session.stats().store.total_chunks, 0);
    }

    #[tokio::test]
    async fn ask_logs_turns_including_degraded() {
        let (mut session, embedder) = session();
        session
            .ingest(NewDocument::plain_text("a.txt", "Apple and pear trees."))
            .await
            .unwrap();

        let result = session.ask("Tell me about apples").await.unwrap();
        assert_eq!(result.citations, "a.txt (Page 1)");
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation()[0].citations, vec!["a.txt (Page 1)"]);

        embedder.fail.store(true, Ordering::SeqCst);
        let degraded = session.ask("And pears?").await.unwrap();
        assert!(degraded.answer.starts_with("Error generating response:"));
        assert_eq!(session.conversation().len(), 2);
        assert_eq!(session.conversation()[1].confidence, 0.0);
    }

    #[tokio::test]
    async fn ask_without_documents_logs_nothing() {
        let (mut session, _) = session();
        let err = session.ask("anything?").await.unwrap_err();
        assert!(matches!(err, DocqError::NoDocuments));
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn single_document_summary_is_executive_summary() {
        let (mut session, _) = session();
        let report = session
            .ingest_batch(&TxtOnly, vec![file("a.txt", "Apple text.")])
            .await;
        let doc = &report.succeeded[0];
        assert_eq!(session.executive_summary(), doc.summary);

        let regenerated = session.regenerate_summary(&doc.id).await.unwrap();
        assert_eq!(regenerated, "The main point is about apples and pears.");
        assert!(session.regenerate_summary("missing").await.is_none());
    }

    #[tokio::test]
    async fn clear_operations() {
        let (mut session, _) = session();
        session
            .ingest(NewDocument::plain_text("a.txt", "Apple text."))
            .await
            .unwrap();
        session.ask("apples?").await.unwrap();

        session.clear_conversation();
        assert!(session.conversation().is_empty());
        assert_eq!(session.stats().store.total_documents, 1);

        session.ask("apples?").await.unwrap();
        session.clear_all();
        let stats = session.stats();
        assert_eq!(stats.store.total_documents, 0);
        assert_eq!(stats.indexed_chunks, 0);
        assert_eq!(stats.conversation_turns, 0);
        assert_eq!(session.executive_summary(), NO_DOCUMENTS_SUMMARY);
        assert!(matches!(session.ask("apples?").await, Err(DocqError::NoDocuments)));
    }

    #[tokio::test]
    async fn report_exposes_three_structures() {
        let (mut session, _) = session();
        session
            .ingest_batch(&TxtOnly, vec![file("a.txt", "Apple text."), file("b.txt", "Pear text.")])
            .await;
        session.ask("pears?").await.unwrap();

        let report = session.report();
        assert_eq!(report.conversation_log.len(), 1);
        assert_eq!(report.document_metadata.len(), 2);
        assert_eq!(report.executive_summary, "The main point is about apples and pears.");
    }

    struct WidthEmbedder(AtomicUsize);

    #[async_trait]
    impl Embedder for WidthEmbedder {
        fn model_name(&self) -> &str {
            "width"
        }
        async fn embed(&self, _text: &str) -> AnyResult<Vec<f32>> {
            Ok(vec![0.5; self.0.load(Ordering::SeqCst)])
        }
    }

    #[tokio::test]
    async fn dimension_mismatch_propagates_and_logs_nothing() {
        let embedder = Arc::new(WidthEmbedder(AtomicUsize::new(4)));
        let mut session = Session::new(
            embedder.clone(),
            Arc::new(FixedGen("answer")),
            SessionConfig::default(),
        )
        .unwrap();
        session
            .ingest(NewDocument::plain_text("a.txt", "Apple text."))
            .await
            .unwrap();

        embedder.0.store(8, Ordering::SeqCst);
        let err = session.ask("apples?").await.unwrap_err();
        assert!(matches!(err, DocqError::DimensionMismatch { expected: 4, actual: 8 }));
        assert!(session.conversation().is_empty());
    }

    struct PromptLog(Mutex<Vec<String>>);

    #[async_trait]
    impl Generator for PromptLog {
        fn model_name(&self) -> &str {
            "log"
        }
        async fn generate(&self, prompt: &str, _t: f32) -> AnyResult<String> {
            self.0.lock().unwrap().push(prompt.to_string());
            Ok("summary".to_string())
        }
    }

    #[tokio::test]
    async fn regenerated_summary_uses_ingested_text() {
        let generator = Arc::new(PromptLog(Mutex::new(Vec::new())));
        let mut session = Session::new(
            Arc::new(VocabEmbedder { fail: AtomicBool::new(false) }),
            generator.clone(),
            SessionConfig::default(),
        )
        .unwrap();

        // Page 2 was blank and dropped by the extractor.
        let doc = session
            .ingest(NewDocument {
                filename: "report.pdf".to_string(),
                file_type: FileType::Pdf,
                text: "Apple harvest.\n\n\nRiver levels.".to_string(),
                pages: vec![
                    Page { number: 1, text: "Apple harvest.".to_string() },
                    Page { number: 3, text: "River levels.".to_string() },
                ],
            })
            .await
            .unwrap();
        session.regenerate_summary(&doc.id).await.unwrap();

        let prompts = generator.0.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
        assert!(prompts[1].contains("Apple harvest.\n\n\nRiver levels."));
    }
}
