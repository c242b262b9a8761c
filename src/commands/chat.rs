//! Interactive chat session over the streaming endpoint
//!
//! Runs a readline loop: slash commands manage the session, anything
//! else is sent to the knowledge base and the answer streams back token
//! by token. Ctrl+C during an answer stops that answer; Ctrl+C at the
//! prompt leaves the session.

use crate::api::ApiClient;
use crate::chat::stream::StreamingChatClient;
use crate::chat::MessageStore;
use crate::commands::special::{parse_special_command, print_help, SpecialCommand};
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Start the interactive chat session
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
///
/// # Returns
///
/// Returns Ok(()) when the user leaves the session.
pub async fn run_chat(config: Config) -> Result<()> {
    let api = ApiClient::new(&config.api)?;
    let client = StreamingChatClient::new(&config.api, &config.chat)?;
    let mut store = MessageStore::new();
    let mut rl = DefaultEditor::new()?;

    print_welcome_banner();

    let mut knowledge_base_id = config.chat.knowledge_base_id;
    if knowledge_base_id.is_none() {
        knowledge_base_id = pick_knowledge_base(&api, &mut rl).await?;
    }
    if let Some(id) = knowledge_base_id {
        println!("Using knowledge base {}\n", id);
    }

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match parse_special_command(trimmed) {
                    Ok(SpecialCommand::Help) => {
                        print_help();
                        continue;
                    }
                    Ok(SpecialCommand::SelectKnowledgeBase(Some(id))) => {
                        knowledge_base_id = Some(id);
                        println!("Switched to knowledge base {}\n", id);
                        continue;
                    }
                    Ok(SpecialCommand::SelectKnowledgeBase(None)) => {
                        if let Some(id) = pick_knowledge_base(&api, &mut rl).await? {
                            knowledge_base_id = Some(id);
                            println!("Switched to knowledge base {}\n", id);
                        }
                        continue;
                    }
                    Ok(SpecialCommand::Sources) => {
                        print_last_sources(&store);
                        continue;
                    }
                    Ok(SpecialCommand::Download(Some(company))) => {
                        download_report(&api, &company).await;
                        continue;
                    }
                    Ok(SpecialCommand::Download(None)) => {
                        download_last_source(&api, &store).await;
                        continue;
                    }
                    Ok(SpecialCommand::Clear) => {
                        store.clear();
                        println!("Conversation cleared\n");
                        continue;
                    }
                    Ok(SpecialCommand::Exit) => break,
                    Ok(SpecialCommand::None) => {}
                    Err(e) => {
                        eprintln!("{}\n", e.to_string().yellow());
                        continue;
                    }
                }

                let Some(kb) = knowledge_base_id else {
                    println!(
                        "{}\n",
                        "No knowledge base selected. Use /kb to pick one.".yellow()
                    );
                    continue;
                };

                stream_question(&client, &mut store, trimmed, kb, config.chat.top_k).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Send one question and stream the answer to stdout.
///
/// A Ctrl+C watcher runs for the duration of the stream; the first
/// interrupt cancels the session instead of killing the process.
async fn stream_question(
    client: &StreamingChatClient,
    store: &mut MessageStore,
    query: &str,
    knowledge_base_id: i64,
    top_k: u32,
) {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    print!("{} ", "ibot>".cyan().bold());
    let _ = std::io::stdout().flush();

    let result = client
        .send(store, query, knowledge_base_id, top_k, cancel, |fragment| {
            print!("{}", fragment);
            let _ = std::io::stdout().flush();
        })
        .await;
    watcher.abort();
    println!();

    match result {
        Ok(state) => super::print_answer_footer(store, state),
        Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
    }
    println!();
}

/// List knowledge bases and let the user pick one by id.
///
/// Backend failures and an empty list both leave the selection
/// unchanged; the user can retry with /kb later.
async fn pick_knowledge_base(api: &ApiClient, rl: &mut DefaultEditor) -> Result<Option<i64>> {
    let bases = match api.list_knowledge_bases().await {
        Ok(bases) => bases,
        Err(e) => {
            eprintln!(
                "{}",
                format!("Error: failed to list knowledge bases: {}", e).red()
            );
            return Ok(None);
        }
    };

    if bases.is_empty() {
        println!(
            "{}",
            "No knowledge bases exist yet. Create one with `ibot kb create <name>`.".yellow()
        );
        return Ok(None);
    }

    super::kb::print_knowledge_base_table(&bases);

    loop {
        match rl.readline("Knowledge base id (empty to skip): ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                match trimmed.parse::<i64>() {
                    Ok(id) if bases.iter().any(|base| base.id == id) => return Ok(Some(id)),
                    Ok(id) => println!("{}", format!("No knowledge base with id {}", id).yellow()),
                    Err(_) => println!("{}", "Enter a numeric id".yellow()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                return Ok(None);
            }
        }
    }
}

fn print_last_sources(store: &MessageStore) {
    let Some(message) = store.last_assistant() else {
        println!("{}\n", "Nothing has been asked yet.".yellow());
        return;
    };

    let Some(sources) = &message.sources else {
        println!("{}\n", "No sources recorded for the last answer.".yellow());
        return;
    };

    println!("{}", "Sources:".bold());
    for source in sources {
        println!("  [{}] {}", source.id, source.name);
    }
    println!();
}

/// Download the document behind the last answer.
///
/// Mirrors the single-source affordance of the web UI: the download is
/// offered only when exactly one document is cited.
async fn download_last_source(api: &ApiClient, store: &MessageStore) {
    let Some(message) = store.last_assistant() else {
        println!("{}\n", "Nothing has been asked yet.".yellow());
        return;
    };
    let Some(sources) = &message.sources else {
        println!("{}\n", "No sources recorded for the last answer.".yellow());
        return;
    };
    let [source] = sources.as_slice() else {
        println!(
            "{}\n",
            format!(
                "The last answer cites {} documents; use /sources to list them and `ibot doc download` to fetch one.",
                sources.len()
            )
            .yellow()
        );
        return;
    };

    match api.download_document(source.id).await {
        Ok(file) => {
            let fallback = format!("document-{}", source.id);
            match super::save_download(&file, None, &fallback).await {
                Ok(path) => println!(
                    "{}\n",
                    format!("Saved {} to {}", source.name, path.display()).green()
                ),
                Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
            }
        }
        Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
    }
}

async fn download_report(api: &ApiClient, company: &str) {
    match api.download_report(company).await {
        Ok(file) => {
            let fallback = format!("{}-report.xlsx", company);
            match super::save_download(&file, None, &fallback).await {
                Ok(path) => println!(
                    "{}\n",
                    format!("Saved report to {}", path.display()).green()
                ),
                Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
            }
        }
        Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
    }
}

/// Display welcome banner at the start of the interactive session
fn print_welcome_banner() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║               ibot Interactive Chat - Welcome!                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Ask questions against your documents; answers stream in live.");
    println!("Type '/help' for available commands, 'exit' to quit\n");
}
