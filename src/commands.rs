//! Implementations of the one-shot `docq` subcommands.
//!
//! Every command builds a fresh in-memory [`Session`] from the config,
//! ingests the given paths and then does its own work. Results go to
//! stdout; progress and logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use doc_insights_core::chunk::chunk_text;
use doc_insights_core::extract::Extractor;
use doc_insights_core::models::AnswerResult;
use doc_insights_core::session::{BatchReport, Session};

use crate::collect::load_sources;
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::export::{render, write_output, ExportFormat};
use crate::extract::FileExtractor;
use crate::generation::create_generator;
use crate::progress::ProgressMode;

/// Create a session with the configured providers.
pub fn build_session(cfg: &Config) -> Result<Session> {
    let embedder = create_embedder(&cfg.embedding)?;
    let generator = create_generator(&cfg.generation)?;
    info!(
        embedding = embedder.model_name(),
        generation = generator.model_name(),
        "providers ready"
    );
    Session::new(embedder, generator, cfg.session_config())
        .context("Failed to create session")
}

/// Load `paths` into `session`, reporting per-file progress on stderr.
pub async fn ingest_paths(
    session: &mut Session,
    cfg: &Config,
    paths: &[PathBuf],
    progress: ProgressMode,
) -> Result<BatchReport> {
    let sources = load_sources(paths, &cfg.ingest)?;
    if sources.is_empty() {
        bail!("No input files found (include globs: {:?})", cfg.ingest.include_globs);
    }
    let reporter = progress.reporter();
    let report = session
        .ingest_batch_observed(&FileExtractor, sources, &mut |n, total, name| {
            reporter.report(n, total, name)
        })
        .await;
    Ok(report)
}

pub fn print_batch_report(report: &BatchReport) {
    println!("{}", report.message);
    for doc in &report.succeeded {
        println!(
            "  ok      {}  ({}, {} chunks)",
            doc.filename, doc.file_type, doc.chunk_count
        );
    }
    for failure in &report.failed {
        println!(
            "  failed  {}  [{}] {}",
            failure.filename, failure.code, failure.message
        );
    }
}

/// Ingest and fail if nothing could be loaded.
async fn ingest_required(
    session: &mut Session,
    cfg: &Config,
    paths: &[PathBuf],
    progress: ProgressMode,
) -> Result<()> {
    let report = ingest_paths(session, cfg, paths, progress).await?;
    if report.succeeded.is_empty() {
        print_batch_report(&report);
        bail!("{}", report.message);
    }
    eprintln!("{}", report.message);
    Ok(())
}

pub async fn run_ingest(
    cfg: &Config,
    paths: &[PathBuf],
    dry_run: bool,
    progress: ProgressMode,
) -> Result<()> {
    if dry_run {
        return run_dry_run(cfg, paths);
    }

    let mut session = build_session(cfg)?;
    let report = ingest_paths(&mut session, cfg, paths, progress).await?;
    print_batch_report(&report);

    let stats = session.stats();
    println!();
    println!("Documents:      {}", stats.store.total_documents);
    println!("Chunks:         {}", stats.store.total_chunks);
    println!("Indexed chunks: {}", stats.indexed_chunks);
    for (file_type, count) in &stats.store.file_types {
        println!("  {:<6} {}", file_type, count);
    }
    Ok(())
}

/// Extract and chunk without calling any provider.
fn run_dry_run(cfg: &Config, paths: &[PathBuf]) -> Result<()> {
    let params = cfg.session_config().chunk;
    let sources = load_sources(paths, &cfg.ingest)?;

    let mut total_chunks = 0;
    for source in &sources {
        match FileExtractor.extract(&source.filename, &source.bytes) {
            Ok(extracted) if extracted.text.trim().is_empty() => {
                println!("{}: skipped (empty content)", source.filename);
            }
            Ok(extracted) => {
                let chunks = chunk_text(&extracted.text, params)?;
                total_chunks += chunks.len();
                println!(
                    "{}: {} pages, {} chunks",
                    source.filename,
                    extracted.pages.len(),
                    chunks.len()
                );
            }
            Err(e) => println!("{}: skipped ({})", source.filename, e),
        }
    }

    println!("Dry run: {} files, {} chunks", sources.len(), total_chunks);
    Ok(())
}

pub fn print_answer(result: &AnswerResult) {
    println!("{}", result.answer);
    if !result.citations.is_empty() {
        println!();
        println!("Sources: {}", result.citations);
    }
    println!("Confidence: {:.0}%", result.confidence * 100.0);
    if !result.key_phrases.is_empty() {
        println!("Key phrases: {}", result.key_phrases.join(", "));
    }
}

pub async fn run_ask(
    cfg: &Config,
    paths: &[PathBuf],
    questions: &[String],
    progress: ProgressMode,
) -> Result<()> {
    let mut session = build_session(cfg)?;
    ingest_required(&mut session, cfg, paths, progress).await?;

    for (i, question) in questions.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if questions.len() > 1 {
            println!("Q{}: {}", i + 1, question);
        }
        let result = session.ask(question).await?;
        print_answer(&result);
    }
    Ok(())
}

pub async fn run_summary(cfg: &Config, paths: &[PathBuf], progress: ProgressMode) -> Result<()> {
    let mut session = build_session(cfg)?;
    ingest_required(&mut session, cfg, paths, progress).await?;
    println!("{}", session.executive_summary());
    Ok(())
}

pub async fn run_report(
    cfg: &Config,
    paths: &[PathBuf],
    questions: &[String],
    format: ExportFormat,
    output: Option<&Path>,
    progress: ProgressMode,
) -> Result<()> {
    let mut session = build_session(cfg)?;
    ingest_required(&mut session, cfg, paths, progress).await?;

    for question in questions {
        session.ask(question).await?;
    }

    let content = render(&session.report(), format, chrono::Utc::now())?;
    write_output(&content, output)
}
