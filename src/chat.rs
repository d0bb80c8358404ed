//! Interactive question loop (`docq chat`).
//!
//! Lines starting with `/` are commands; anything else is a question.
//! The prompt is only printed when stdin is a terminal, so the loop can be
//! driven by a pipe.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use doc_insights_core::session::Session;
use doc_insights_core::DocqError;

use crate::commands::print_answer;
use crate::export::{render, write_output, ExportFormat};

const HELP: &str = "\
Commands:
  /summary                      show the executive summary
  /stats                        show document statistics
  /clear                        clear the conversation
  /reset                        drop all documents and the conversation
  /export <format> <path>       write a markdown, json or summary report
  /quit                         leave
Anything else is asked as a question.";

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Ask(String),
    Summary,
    Stats,
    Clear,
    Reset,
    Export { format: ExportFormat, path: PathBuf },
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Parse one input line.
pub fn parse_command(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    match parts.next().unwrap_or_default() {
        "summary" => ChatCommand::Summary,
        "stats" => ChatCommand::Stats,
        "clear" => ChatCommand::Clear,
        "reset" => ChatCommand::Reset,
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        "export" => match (parts.next(), parts.next()) {
            (Some(format), Some(path)) => match format.parse::<ExportFormat>() {
                Ok(format) => ChatCommand::Export {
                    format,
                    path: PathBuf::from(path),
                },
                Err(e) => ChatCommand::Invalid(e.to_string()),
            },
            _ => ChatCommand::Invalid("usage: /export <markdown|json|summary> <path>".to_string()),
        },
        other => ChatCommand::Invalid(format!("unknown command: /{} (try /help)", other)),
    }
}

/// Run the loop until `/quit` or end of input.
pub async fn run_chat(session: &mut Session) -> Result<()> {
    let interactive = atty::is(atty::Stream::Stdin);
    if interactive {
        println!("{} documents loaded. Type /help for commands.", session.documents().len());
    }

    let stdin = io::stdin();
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush()?;
        }

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        match parse_command(&input) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("{}", HELP),
            ChatCommand::Invalid(message) => eprintln!("{}", message),
            ChatCommand::Summary => println!("{}", session.executive_summary()),
            ChatCommand::Stats => {
                let stats = session.stats();
                println!(
                    "{} documents, {} chunks, {} questions",
                    stats.store.total_documents, stats.store.total_chunks, stats.conversation_turns
                );
                for name in &stats.document_list {
                    println!("  {}", name);
                }
            }
            ChatCommand::Clear => {
                session.clear_conversation();
                println!("Conversation cleared.");
            }
            ChatCommand::Reset => {
                session.clear_all();
                println!("All documents and conversation cleared.");
            }
            ChatCommand::Export { format, path } => {
                let content = render(&session.report(), format, chrono::Utc::now())?;
                if let Err(e) = write_output(&content, Some(&path)) {
                    eprintln!("{:#}", e);
                }
            }
            ChatCommand::Ask(question) => match session.ask(&question).await {
                Ok(result) => {
                    print_answer(&result);
                    println!();
                }
                Err(DocqError::NoDocuments) => {
                    eprintln!("No documents loaded. Restart docq chat with some files.")
                }
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }
    Ok(())
}
