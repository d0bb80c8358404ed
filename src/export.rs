//! Report renderers.
//!
//! Pure functions over a session [`Report`]: a Markdown analysis report, a
//! JSON conversation export and the plain executive summary. The caller
//! picks the destination (stdout or a file).

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use doc_insights_core::models::{ConversationTurn, Document};
use doc_insights_core::session::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Markdown,
    Json,
    Summary,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Summary => "text/plain; charset=utf-8",
        }
    }

    /// Suggested download name, e.g. `document_analysis_report_20250101_120000.md`.
    pub fn file_name(&self, now: DateTime<Utc>) -> String {
        let stamp = now.format("%Y%m%d_%H%M%S");
        match self {
            ExportFormat::Markdown => format!("document_analysis_report_{}.md", stamp),
            ExportFormat::Json => format!("conversation_export_{}.json", stamp),
            ExportFormat::Summary => format!("executive_summary_{}.txt", stamp),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            "summary" | "txt" => Ok(ExportFormat::Summary),
            other => bail!("Unknown export format: '{}'. Must be markdown, json, or summary.", other),
        }
    }
}

/// Render `report` in `format`, stamped with `now`.
pub fn render(report: &Report, format: ExportFormat, now: DateTime<Utc>) -> Result<String> {
    match format {
        ExportFormat::Markdown => Ok(markdown_report(report, now)),
        ExportFormat::Json => json_export(report, now),
        ExportFormat::Summary => Ok(summary_text(report)),
    }
}

pub fn markdown_report(report: &Report, now: DateTime<Utc>) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Document Analysis Report\n");
    let _ = writeln!(md, "**Generated on:** {}\n", now.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(md, "## Executive Summary\n");
    let _ = writeln!(md, "{}\n", report.executive_summary);
    let _ = writeln!(md, "## Document Overview\n");

    for doc in &report.document_metadata {
        let _ = writeln!(md, "- **{}** ({})", doc.filename, doc.file_type);
        let _ = writeln!(md, "  - Chunks: {}", doc.chunk_count);
        let _ = writeln!(md, "  - Upload Date: {}\n", doc.upload_time.format("%Y-%m-%d"));
    }

    if !report.conversation_log.is_empty() {
        let _ = writeln!(md, "## Questions and Answers\n");
        for (i, turn) in report.conversation_log.iter().enumerate() {
            let _ = writeln!(md, "### Q{}: {}\n", i + 1, turn.question);
            let _ = writeln!(md, "**Answer:** {}\n", turn.answer);
            if !turn.citations.is_empty() {
                let _ = writeln!(md, "**Sources:** {}\n", turn.citations.join("; "));
            }
            let _ = writeln!(md, "---\n");
        }
    }

    md
}

#[derive(Serialize)]
struct JsonExport<'a> {
    export_date: String,
    document_metadata: &'a [Document],
    conversation_history: &'a [ConversationTurn],
}

pub fn json_export(report: &Report, now: DateTime<Utc>) -> Result<String> {
    let data = JsonExport {
        export_date: now.to_rfc3339(),
        document_metadata: &report.document_metadata,
        conversation_history: &report.conversation_log,
    };
    serde_json::to_string_pretty(&data).context("Failed to serialize export")
}

pub fn summary_text(report: &Report) -> String {
    format!("{}\n", report.executive_summary)
}

/// Write rendered output to `output`, or stdout when `None`.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} ({} bytes)", path.display(), content.len());
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use doc_insights_core::models::FileType;

    fn sample_report() -> Report {
        let when = Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        Report {
            conversation_log: vec![ConversationTurn {
                question: "What is covered?".to_string(),
                answer: "Quarterly revenue.".to_string(),
                citations: vec!["q1.pdf (Page 2)".to_string(), "q1.pdf (Page 3)".to_string()],
                confidence: 0.64,
                timestamp: when,
            }],
            document_metadata: vec![Document {
                id: "d1".to_string(),
                filename: "q1.pdf".to_string(),
                file_type: FileType::Pdf,
                upload_time: when,
                pages: Vec::new(),
                text: "Revenue rose.".to_string(),
                summary: "Revenue report.".to_string(),
                chunk_count: 7,
            }],
            executive_summary: "Revenue grew.".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
    }

    #[test]
    fn markdown_sections() {
        let md = markdown_report(&sample_report(), now());
        assert!(md.starts_with("# Document Analysis Report\n"));
        assert!(md.contains("**Generated on:** 2024-03-06 10:00:00"));
        assert!(md.contains("## Executive Summary\n\nRevenue grew."));
        assert!(md.contains("- **q1.pdf** (pdf)\n  - Chunks: 7\n  - Upload Date: 2024-03-05"));
        assert!(md.contains("### Q1: What is covered?"));
        assert!(md.contains("**Sources:** q1.pdf (Page 2); q1.pdf (Page 3)"));
    }

    #[test]
    fn markdown_without_questions_has_no_qa_section() {
        let mut report = sample_report();
        report.conversation_log.clear();
        assert!(!markdown_report(&report, now()).contains("Questions and Answers"));
    }

    #[test]
    fn json_shape() {
        let json = json_export(&sample_report(), now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["export_date"].as_str().unwrap().starts_with("2024-03-06T10:00:00"));
        assert_eq!(value["document_metadata"][0]["filename"], "q1.pdf");
        assert_eq!(value["document_metadata"][0]["file_type"], "pdf");
        assert_eq!(value["conversation_history"][0]["citations"][1], "q1.pdf (Page 3)");
    }

    #[test]
    fn format_parsing_and_names() {
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("summary".parse::<ExportFormat>().unwrap(), ExportFormat::Summary);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(
            ExportFormat::Json.file_name(now()),
            "conversation_export_20240306_100000.json"
        );
        assert_eq!(summary_text(&sample_report()), "Revenue grew.\n");
    }
}
