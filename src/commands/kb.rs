//! Knowledge base management commands

use crate::api::types::KnowledgeBase;
use crate::api::ApiClient;
use crate::cli::KbCommand;
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use prettytable::{row, Table};

/// Dispatch a `kb` subcommand
pub async fn run_kb(config: Config, command: KbCommand) -> Result<()> {
    let api = ApiClient::new(&config.api)?;

    match command {
        KbCommand::List => list(&api).await,
        KbCommand::Create { name, description } => {
            create(&api, &name, description.as_deref().unwrap_or("")).await
        }
        KbCommand::Delete { id, yes } => delete(&api, id, yes).await,
    }
}

async fn list(api: &ApiClient) -> Result<()> {
    let bases = api.list_knowledge_bases().await?;

    if bases.is_empty() {
        println!("No knowledge bases found.");
        return Ok(());
    }

    print_knowledge_base_table(&bases);
    Ok(())
}

async fn create(api: &ApiClient, name: &str, description: &str) -> Result<()> {
    api.create_knowledge_base(name, description).await?;
    println!("{}", format!("Created knowledge base '{}'", name).green());
    Ok(())
}

async fn delete(api: &ApiClient, id: i64, yes: bool) -> Result<()> {
    let prompt = format!("Delete knowledge base {} and all of its documents?", id);
    if !super::confirm_or_yes(yes, &prompt)? {
        println!("Aborted.");
        return Ok(());
    }
    api.delete_knowledge_base(id).await?;
    println!("{}", format!("Deleted knowledge base {}", id).green());
    Ok(())
}

/// Render knowledge bases as a table. Shared with the chat picker.
pub(crate) fn print_knowledge_base_table(bases: &[KnowledgeBase]) {
    let mut table = Table::new();
    table.add_row(row!["ID", "Name", "Documents", "Status", "Created"]);

    for base in bases {
        table.add_row(row![
            base.id,
            base.name,
            base.doc_count,
            base.status,
            base.created_at
        ]);
    }

    println!();
    table.printstd();
    println!();
}
