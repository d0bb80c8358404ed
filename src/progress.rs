//! Ingestion progress reporting.
//!
//! Reports which file is being processed during `docq ingest` (and the
//! ingestion step of the other commands). Progress is emitted on
//! **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// Reports ingestion progress. Implementations write to stderr.
pub trait IngestProgressReporter: Send + Sync {
    /// Called before file `n` of `total` (1-based) is extracted and indexed.
    fn report(&self, n: usize, total: usize, filename: &str);
}

/// Human-friendly progress on stderr: "ingest  2 / 5  report.pdf".
pub struct StderrProgress;

impl IngestProgressReporter for StderrProgress {
    fn report(&self, n: usize, total: usize, filename: &str) {
        let line = format!(
            "ingest  {} / {}  {}\n",
            format_number(n),
            format_number(total),
            filename
        );
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IngestProgressReporter for JsonProgress {
    fn report(&self, n: usize, total: usize, filename: &str) {
        let obj = serde_json::json!({
            "event": "progress",
            "phase": "ingesting",
            "n": n,
            "total": total,
            "file": filename,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

pub struct NoProgress;

impl IngestProgressReporter for NoProgress {
    fn report(&self, _n: usize, _total: usize, _filename: &str) {}
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    Auto,
    Off,
    Human,
    Json,
}

impl ProgressMode {
    pub fn reporter(&self) -> Box<dyn IngestProgressReporter> {
        match self.resolve() {
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
            _ => Box::new(NoProgress),
        }
    }

    fn resolve(self) -> Self {
        match self {
            ProgressMode::Auto if atty::is(atty::Stream::Stderr) => ProgressMode::Human,
            ProgressMode::Auto => ProgressMode::Off,
            other => other,
        }
    }
}
