//! Document management commands
//!
//! Uploading places a file in a knowledge base; parsing chunks and
//! indexes it so chat can retrieve from it. Parsing is asynchronous on
//! the server, so `--wait` polls until the document reaches a terminal
//! status.

use crate::api::types::{Document, DocumentStatus};
use crate::api::ApiClient;
use crate::cli::DocCommand;
use crate::config::Config;
use crate::error::{IbotError, Result};
use colored::{ColoredString, Colorize};
use prettytable::{row, Table};
use std::path::{Path, PathBuf};

/// Dispatch a `doc` subcommand
pub async fn run_doc(config: Config, command: DocCommand) -> Result<()> {
    let api = ApiClient::new(&config.api)?;

    match command {
        DocCommand::List { knowledge_base } => list(&api, knowledge_base).await,
        DocCommand::Upload {
            knowledge_base,
            file,
            parse,
            wait,
        } => upload(&api, knowledge_base, &file, parse || wait, wait).await,
        DocCommand::Parse {
            id,
            knowledge_base,
            wait,
        } => parse(&api, knowledge_base, id, false, wait).await,
        DocCommand::Reparse {
            id,
            knowledge_base,
            wait,
        } => parse(&api, knowledge_base, id, true, wait).await,
        DocCommand::Delete { id, yes } => delete(&api, id, yes).await,
        DocCommand::Download { id, output } => download(&api, id, output).await,
    }
}

async fn list(api: &ApiClient, knowledge_base_id: i64) -> Result<()> {
    let documents = api.list_documents(knowledge_base_id).await?;

    if documents.is_empty() {
        println!("No documents in knowledge base {}.", knowledge_base_id);
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["ID", "Name", "Type", "Size", "Status", "Chunks", "Created"]);

    for doc in &documents {
        table.add_row(row![
            doc.id,
            doc.name,
            doc.file_type,
            format_size(doc.file_size),
            colored_status(&doc.status),
            doc.chunk_count,
            doc.created_at
        ]);
    }

    println!();
    table.printstd();
    println!();
    Ok(())
}

async fn upload(
    api: &ApiClient,
    knowledge_base_id: i64,
    file: &Path,
    start_parsing: bool,
    wait: bool,
) -> Result<()> {
    api.upload_document(knowledge_base_id, file).await?;
    println!("{}", format!("Uploaded {}", file.display()).green());

    if !start_parsing {
        return Ok(());
    }

    // The upload response carries no document id, so find the new entry
    // by filename; ids are monotonic, so the highest one is ours.
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IbotError::Precondition(format!("invalid file name: {}", file.display()))
        })?;
    let documents = api.list_documents(knowledge_base_id).await?;
    let document = newest_by_name(&documents, file_name).ok_or_else(|| {
        IbotError::Transport(format!(
            "uploaded document '{}' not found in knowledge base {}",
            file_name, knowledge_base_id
        ))
    })?;

    api.start_parse(document.id).await?;
    println!("Parse started for document {}", document.id);

    if wait {
        wait_and_report(api, knowledge_base_id, document.id).await?;
    }
    Ok(())
}

async fn parse(
    api: &ApiClient,
    knowledge_base_id: i64,
    document_id: i64,
    reparse: bool,
    wait: bool,
) -> Result<()> {
    if reparse {
        api.reparse_document(document_id).await?;
        println!("Re-parse started for document {}", document_id);
    } else {
        api.start_parse(document_id).await?;
        println!("Parse started for document {}", document_id);
    }

    if wait {
        wait_and_report(api, knowledge_base_id, document_id).await?;
    }
    Ok(())
}

async fn delete(api: &ApiClient, id: i64, yes: bool) -> Result<()> {
    let prompt = format!("Delete document {}?", id);
    if !super::confirm_or_yes(yes, &prompt)? {
        println!("Aborted.");
        return Ok(());
    }
    api.delete_document(id).await?;
    println!("{}", format!("Deleted document {}", id).green());
    Ok(())
}

async fn wait_and_report(api: &ApiClient, knowledge_base_id: i64, document_id: i64) -> Result<()> {
    println!("Waiting for parsing to finish...");
    let status = api.wait_for_parse(knowledge_base_id, document_id).await?;
    match status {
        DocumentStatus::Completed => {
            println!("{}", format!("Document {} parsed", document_id).green())
        }
        other => println!(
            "{}",
            format!("Document {} finished with status {}", document_id, other).red()
        ),
    }
    Ok(())
}

async fn download(api: &ApiClient, id: i64, output: Option<PathBuf>) -> Result<()> {
    let file = api.download_document(id).await?;
    let fallback = format!("document-{}", id);
    let path = super::save_download(&file, output.as_deref(), &fallback).await?;
    println!(
        "{}",
        format!("Saved {} ({} bytes)", path.display(), file.bytes.len()).green()
    );
    Ok(())
}

/// Human-readable file size for the document listing
fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn colored_status(status: &DocumentStatus) -> ColoredString {
    match status {
        DocumentStatus::Completed => status.as_str().green(),
        DocumentStatus::Failed => status.as_str().red(),
        DocumentStatus::Processing => status.as_str().cyan(),
        _ => status.as_str().normal(),
    }
}

/// Pick the newest document with the given name.
fn newest_by_name<'a>(documents: &'a [Document], name: &str) -> Option<&'a Document> {
    documents
        .iter()
        .filter(|doc| doc.name == name)
        .max_by_key(|doc| doc.id)
}
