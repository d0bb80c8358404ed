//! CLI tests against the built `docq` binary.
//!
//! Only paths that need no external service are exercised: dry runs,
//! completions, config validation and ingestion with the default
//! `disabled` providers.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docq_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_docq"))
}

fn run_docq(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(docq_binary())
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .env_remove("OPENAI_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .output()
        .expect("failed to run docq");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn setup_files() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("alpha.txt"),
        "Alpha plant report. Output rose in March. The new line opened in April.",
    )
    .unwrap();
    fs::write(docs.join("empty.txt"), "   \n").unwrap();
    fs::write(docs.join("notes.md"), "# not collected").unwrap();
    tmp
}

#[test]
fn dry_run_chunks_without_providers() {
    let tmp = setup_files();
    let (stdout, stderr, success) = run_docq(tmp.path(), &["ingest", "docs", "--dry-run"]);
    assert!(success, "dry run failed: stdout={}, stderr={}", stdout, stderr);

    assert!(stdout.contains("alpha.txt: 1 pages, 1 chunks"), "got: {}", stdout);
    assert!(stdout.contains("empty.txt: skipped (empty content)"), "got: {}", stdout);
    assert!(!stdout.contains("notes.md"));
    assert!(stdout.contains("Dry run: 2 files, 1 chunks"), "got: {}", stdout);
}

#[test]
fn ingest_with_disabled_embeddings_reports_failures() {
    let tmp = setup_files();
    let (stdout, stderr, success) =
        run_docq(tmp.path(), &["--progress", "off", "ingest", "docs/alpha.txt"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);

    assert!(stdout.contains("Failed to process any documents."), "got: {}", stdout);
    assert!(stdout.contains("failed  alpha.txt  [external_service]"), "got: {}", stdout);
    assert!(stdout.contains("Documents:      0"));
}

#[test]
fn ask_fails_when_nothing_loads() {
    let tmp = setup_files();
    let (_, stderr, success) = run_docq(
        tmp.path(),
        &["--progress", "off", "ask", "docs/alpha.txt", "-q", "When did the line open?"],
    );
    assert!(!success);
    assert!(stderr.contains("Failed to process any documents."), "got: {}", stderr);
}

#[test]
fn json_progress_goes_to_stderr() {
    let tmp = setup_files();
    let (stdout, stderr, _) =
        run_docq(tmp.path(), &["--progress", "json", "ingest", "docs/alpha.txt"]);

    assert!(!stdout.contains("\"event\""));
    let line = stderr
        .lines()
        .find(|l| l.contains("\"event\":\"progress\""))
        .unwrap_or_else(|| panic!("no progress line in stderr: {}", stderr));
    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(value["n"], 1);
    assert_eq!(value["total"], 1);
    assert_eq!(value["file"], "alpha.txt");
}

#[test]
fn missing_input_path_is_an_error() {
    let tmp = setup_files();
    let (_, stderr, success) = run_docq(tmp.path(), &["ingest", "nowhere", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("does not exist"), "got: {}", stderr);
}

#[test]
fn invalid_config_is_rejected() {
    let tmp = setup_files();
    let config = tmp.path().join("docq.toml");

    fs::write(&config, "[chunking]\nsize = 100\noverlap = 100\n").unwrap();
    let (_, stderr, success) = run_docq(
        tmp.path(),
        &["--config", "docq.toml", "ingest", "docs", "--dry-run"],
    );
    assert!(!success);
    assert!(stderr.contains("chunking.overlap"), "got: {}", stderr);

    fs::write(&config, "[embedding]\nprovider = \"cohere\"\n").unwrap();
    let (_, stderr, success) = run_docq(
        tmp.path(),
        &["--config", "docq.toml", "ingest", "docs", "--dry-run"],
    );
    assert!(!success);
    assert!(stderr.contains("Unknown embedding provider"), "got: {}", stderr);
}

#[test]
fn completions_need_no_config() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, success) = run_docq(
        tmp.path(),
        &["--config", "missing.toml", "completions", "bash"],
    );
    assert!(success);
    assert!(stdout.contains("docq"));
}
