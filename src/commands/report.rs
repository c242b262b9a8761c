//! Carbon report downloads and company lookups

use crate::api::ApiClient;
use crate::cli::ReportCommand;
use crate::config::Config;
use crate::error::{IbotError, Result};
use colored::Colorize;
use prettytable::{row, Table};

/// Dispatch a `report` subcommand
pub async fn run_report(config: Config, command: ReportCommand) -> Result<()> {
    let api = ApiClient::new(&config.api)?;

    match command {
        ReportCommand::Download { company, output } => {
            let file = api.download_report(&company).await?;
            let fallback = format!("{}-report.xlsx", company);
            let path = super::save_download(&file, output.as_deref(), &fallback).await?;
            println!(
                "{}",
                format!("Saved report to {} ({} bytes)", path.display(), file.bytes.len()).green()
            );
            Ok(())
        }
        ReportCommand::Template { output } => {
            let file = api.download_template().await?;
            let path =
                super::save_download(&file, output.as_deref(), "carbon-template.xlsx").await?;
            println!(
                "{}",
                format!("Saved template to {} ({} bytes)", path.display(), file.bytes.len())
                    .green()
            );
            Ok(())
        }
        ReportCommand::Companies => {
            let companies = api.fetch_company_list().await?;

            if companies.is_empty() {
                println!("No companies found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.add_row(row!["ID", "Name", "Industry"]);
            for company in &companies {
                let id = company
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let industry = company.industry.as_deref().unwrap_or("-");
                table.add_row(row![id, company.name, industry]);
            }

            println!();
            table.printstd();
            println!();
            Ok(())
        }
        ReportCommand::Company { name } => {
            let record = api.company_by_name(&name).await?;
            let json = serde_json::to_string_pretty(&record).map_err(IbotError::Serialization)?;
            println!("{}", json);
            Ok(())
        }
    }
}
