//! # doc-insights CLI (`docq`)
//!
//! Load PDF and text documents into an in-memory session, then ask
//! questions with cited answers, generate summaries and export reports,
//! or serve the same session over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! docq [--config ./docq.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docq ingest <paths..>` | Ingest files and print the batch report |
//! | `docq ask <paths..> -q "<question>"` | Ingest, then answer questions with citations |
//! | `docq chat <paths..>` | Interactive question loop |
//! | `docq summary <paths..>` | Print the executive summary |
//! | `docq report <paths..> -q ... --format markdown` | Export a report |
//! | `docq serve` | Start the HTTP API |
//! | `docq completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Check what would be chunked, without calling any provider
//! docq ingest ./reports --dry-run
//!
//! # Ask two questions over a folder of PDFs
//! docq ask ./reports -q "What was Q3 revenue?" -q "Who signed the audit?"
//!
//! # Write a markdown report
//! docq report ./reports -q "Key risks?" --format markdown --output report.md
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use doc_insights::config;
use doc_insights::export::ExportFormat;
use doc_insights::progress::ProgressMode;
use doc_insights::{chat, commands, server};

/// doc-insights: question answering and summaries over your documents.
///
/// Secrets such as `OPENAI_API_KEY` and `GEMINI_API_KEY` are read from the
/// environment; a `.env` file in the working directory is loaded first.
#[derive(Parser)]
#[command(
    name = "docq",
    about = "doc-insights: ask questions about PDF and text documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ingestion progress on stderr.
    #[arg(long, global = true, value_enum, default_value = "auto")]
    progress: ProgressMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest files and print the batch report and statistics.
    ///
    /// Paths may be files or directories. Directories are walked and
    /// filtered by `[ingest].include_globs`.
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Extract and chunk only; no embedding or generation calls.
        #[arg(long)]
        dry_run: bool,
    },

    /// Ingest files, then answer each question.
    Ask {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Question to ask (repeatable).
        #[arg(short, long = "question", required = true)]
        questions: Vec<String>,
    },

    /// Ingest files, then read questions and commands from stdin.
    Chat {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ingest files and print the executive summary.
    Summary {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ingest files, ask the questions and export a report.
    Report {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Question to include in the report (repeatable).
        #[arg(short, long = "question")]
        questions: Vec<String>,

        #[arg(long, value_enum, default_value = "markdown")]
        format: ExportFormat,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP API.
    ///
    /// Binds to `[server].bind` unless `--bind` is given.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },

    /// Generate shell completions for bash, zsh, fish, or PowerShell.
    ///
    /// Output is written to stdout. Example:
    /// `docq completions zsh > ~/.zsh/completions/_docq`
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "docq", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(cli.config.as_deref())?;
    let progress = cli.progress;

    match cli.command {
        Commands::Ingest { paths, dry_run } => {
            commands::run_ingest(&cfg, &paths, dry_run, progress).await?;
        }
        Commands::Ask { paths, questions } => {
            commands::run_ask(&cfg, &paths, &questions, progress).await?;
        }
        Commands::Chat { paths } => {
            let mut session = commands::build_session(&cfg)?;
            let report = commands::ingest_paths(&mut session, &cfg, &paths, progress).await?;
            commands::print_batch_report(&report);
            chat::run_chat(&mut session).await?;
        }
        Commands::Summary { paths } => {
            commands::run_summary(&cfg, &paths, progress).await?;
        }
        Commands::Report {
            paths,
            questions,
            format,
            output,
        } => {
            commands::run_report(&cfg, &paths, &questions, format, output.as_deref(), progress)
                .await?;
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
            let session = Arc::new(Mutex::new(commands::build_session(&cfg)?));
            server::run_server(&bind, session).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
