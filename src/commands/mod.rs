/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes one module per top-level command:

- `chat`    - Interactive streaming chat session
- `ask`     - One-shot question
- `kb`      - Knowledge base management
- `doc`     - Document upload, parsing, and download
- `report`  - Carbon report downloads and company lookups
- `carbon`  - Carbon dataset wizard, generation, validation, import

These handlers are intentionally small and use the library components:
the API client, the streaming chat client, and the carbon module.
*/

use crate::api::types::DownloadedFile;
use crate::chat::stream::{SessionState, STOPPED_MARKER};
use crate::chat::{is_no_answer, MessageStore};
use crate::error::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};

pub mod ask;
pub mod carbon;
pub mod chat;
pub mod doc;
pub mod kb;
pub mod report;
pub mod special;

/// Ask before a destructive operation unless `--yes` was passed.
///
/// Anything other than an explicit yes declines, including Ctrl+C
/// and Ctrl+D.
pub(crate) fn confirm_or_yes(yes: bool, prompt: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let mut rl = DefaultEditor::new()?;
    match rl.readline(&format!("{prompt} [y/N] ")) {
        Ok(line) => Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes")),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Write a downloaded file to disk.
///
/// Uses `output` when given, otherwise the server-suggested filename,
/// otherwise `fallback`.
pub(crate) async fn save_download(
    file: &DownloadedFile,
    output: Option<&Path>,
    fallback: &str,
) -> Result<PathBuf> {
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file.filename.as_deref().unwrap_or(fallback)),
    };
    tokio::fs::write(&target, &file.bytes).await?;
    Ok(target)
}

/// Print what follows a streamed answer: sources, thinking time, and the
/// no-answer hint on success; the stored error or stop marker otherwise.
///
/// Streamed fragments have already been written to stdout by the time
/// this runs, so error and stop text is only printed when it never went
/// through the fragment callback.
pub(crate) fn print_answer_footer(store: &MessageStore, state: SessionState) {
    let Some(message) = store.last_assistant() else {
        return;
    };

    match state {
        SessionState::Errored => {
            eprintln!("{}", message.content.red());
        }
        SessionState::Cancelled => {
            if message.content == STOPPED_MARKER {
                println!("{}", STOPPED_MARKER.yellow());
            }
        }
        _ => {
            if let Some(sources) = &message.sources {
                println!("\n{}", "Sources:".bold());
                for source in sources {
                    println!("  [{}] {}", source.id, source.name);
                }
            }
            if let Some(seconds) = message.thinking_time {
                println!("{}", format!("({seconds:.1}s)").dimmed());
            }
            if is_no_answer(&message.content) {
                println!(
                    "{}",
                    "The knowledge base did not cover this question. Try rephrasing it or picking another knowledge base."
                        .yellow()
                );
            }
        }
    }
}
