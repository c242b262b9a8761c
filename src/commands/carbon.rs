//! Carbon dataset commands
//!
//! The wizard walks through company information and the four data
//! sections step by step, mirroring the data-entry flow of the web UI:
//! company, daily records, scope 2, scope 3, satellite, review. Sections
//! can be generated or skipped, but the import is gated on every section
//! being present and the dataset passing validation.
//!
//! `generate`, `validate`, and `import` cover the non-interactive path:
//! write a dataset to a JSON file, check a file, send a file.

use crate::api::ApiClient;
use crate::api::types::ImportSummary;
use crate::carbon::generators;
use crate::carbon::validators::{self, ValidationReport};
use crate::carbon::{
    CompanyInfo, DailyData, DataImportPayload, Industry, SatelliteData, Scope2Data, Scope3Data,
};
use crate::cli::CarbonCommand;
use crate::config::{CarbonConfig, Config};
use crate::error::{IbotError, Result};
use chrono::NaiveDate;
use colored::Colorize;
use rand::Rng;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

/// Dispatch a `carbon` subcommand
pub async fn run_carbon(config: Config, command: CarbonCommand) -> Result<()> {
    match command {
        CarbonCommand::Wizard => run_wizard(&config).await,
        CarbonCommand::Generate {
            industry,
            name,
            number,
            region,
            year,
            output,
        } => generate(&config, &industry, &name, number, region, year, &output).await,
        CarbonCommand::Validate { file } => validate_file(&file).await,
        CarbonCommand::Import { file, user } => import_file(&config, &file, user).await,
    }
}

/// Sections collected by the wizard before they become a payload.
#[derive(Default)]
struct DraftDataset {
    company: Option<CompanyInfo>,
    daily: Vec<DailyData>,
    scope2: Option<Scope2Data>,
    scope3: Option<Scope3Data>,
    satellite: Vec<SatelliteData>,
}

impl DraftDataset {
    fn missing_sections(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.company.is_none() {
            missing.push("company info");
        }
        if self.daily.is_empty() {
            missing.push("daily emission data");
        }
        if self.scope2.is_none() {
            missing.push("scope 2 data");
        }
        if self.scope3.is_none() {
            missing.push("scope 3 data");
        }
        if self.satellite.is_empty() {
            missing.push("satellite data");
        }
        missing
    }

    fn into_payload(self, user_id: Option<i64>) -> Option<DataImportPayload> {
        if self.daily.is_empty() || self.satellite.is_empty() {
            return None;
        }
        Some(DataImportPayload {
            company: self.company?,
            daily_data: self.daily,
            scope2: self.scope2?,
            scope3: self.scope3?,
            satellite_data: self.satellite,
            user_id,
        })
    }
}

async fn run_wizard(config: &Config) -> Result<()> {
    tracing::info!("Starting carbon data wizard");

    let mut rl = DefaultEditor::new()?;
    print_wizard_banner();

    println!("{}", "Step 1 of 6: company information".bold());
    let Some((company, year)) = prompt_company(&mut rl, config)? else {
        return aborted();
    };

    let mut draft = DraftDataset::default();

    println!("\n{}", "Step 2 of 6: daily emission records".bold());
    let Some(wanted) = prompt_yes_no(&mut rl, "Generate a full year of daily records? [Y/n]: ", true)?
    else {
        return aborted();
    };
    if wanted {
        draft.daily = generators::generate_daily_data(&company.number, company.industry, year);
        println!("{}", format!("Generated {} records", draft.daily.len()).green());
    } else {
        println!("Skipped.");
    }

    println!("\n{}", "Step 3 of 6: scope 2 electricity data".bold());
    let Some(wanted) = prompt_yes_no(&mut rl, "Generate scope 2 data? [Y/n]: ", true)? else {
        return aborted();
    };
    if wanted {
        let scope2 = generators::generate_scope2_data(&company.number, year);
        println!(
            "{}",
            format!(
                "Generated {:.0} kWh, {:.2} tCO2e",
                scope2.electricity_consumption_kwh,
                scope2.scope2_emissions.unwrap_or(0.0)
            )
            .green()
        );
        draft.scope2 = Some(scope2);
    } else {
        println!("Skipped.");
    }

    println!("\n{}", "Step 4 of 6: scope 3 emission dimensions".bold());
    let Some(wanted) = prompt_yes_no(
        &mut rl,
        &format!("Generate the 4 dimensions for {}? [Y/n]: ", company.industry),
        true,
    )?
    else {
        return aborted();
    };
    if wanted {
        let scope3 = generators::generate_scope3_data(
            &company.number,
            &company.name,
            company.industry,
            year,
        );
        println!(
            "{}",
            format!(
                "Generated {} dimensions, total {:.2} tCO2e",
                scope3.dimensions.len(),
                scope3.total.unwrap_or(0.0)
            )
            .green()
        );
        draft.scope3 = Some(scope3);
    } else {
        println!("Skipped.");
    }

    println!("\n{}", "Step 5 of 6: satellite observations".bold());
    let Some(wanted) = prompt_yes_no(
        &mut rl,
        &format!(
            "Generate {} observations around ({}, {})? [Y/n]: ",
            config.carbon.satellite_count,
            config.carbon.center_latitude,
            config.carbon.center_longitude
        ),
        true,
    )?
    else {
        return aborted();
    };
    if wanted {
        draft.satellite = generators::generate_satellite_data(
            &company.number,
            config.carbon.center_latitude,
            config.carbon.center_longitude,
            config.carbon.satellite_count,
        );
        println!(
            "{}",
            format!("Generated {} observations", draft.satellite.len()).green()
        );
    } else {
        println!("Skipped.");
    }

    println!("\n{}", "Step 6 of 6: review and import".bold());
    draft.company = Some(company);

    let missing = draft.missing_sections();
    if !missing.is_empty() {
        println!(
            "{}",
            format!("Missing sections: {}", missing.join(", ")).yellow()
        );
        println!("Complete every section before importing. Nothing was sent.");
        return Ok(());
    }

    let Some(payload) = draft.into_payload(config.carbon.user_id) else {
        return Err(IbotError::Precondition("dataset is incomplete".to_string()).into());
    };
    print_review(&payload);

    let report = validators::validate_payload(&payload);
    print_validation_report(&report);
    if !report.is_valid() {
        return Err(IbotError::Precondition("dataset failed validation".to_string()).into());
    }

    let Some(save_path) = prompt_optional(&mut rl, "Save a JSON copy to (empty to skip): ")? else {
        return aborted();
    };
    if let Some(path) = save_path {
        write_dataset(Path::new(&path), &payload).await?;
        println!("{}", format!("Wrote dataset to {}", path).green());
    }

    let Some(confirmed) = prompt_yes_no(&mut rl, "Import this dataset now? [y/N]: ", false)? else {
        return aborted();
    };
    if !confirmed {
        println!("Import skipped.");
        return Ok(());
    }

    let api = ApiClient::new(&config.api)?;
    let summary = api.import_carbon_data(&payload).await?;
    print_import_summary(&summary);
    Ok(())
}

async fn generate(
    config: &Config,
    industry_raw: &str,
    name: &str,
    number: Option<String>,
    region: Option<String>,
    year: Option<i32>,
    output: &Path,
) -> Result<()> {
    let industry: Industry = industry_raw.parse()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(IbotError::Precondition("company name must not be empty".to_string()).into());
    }

    let company = CompanyInfo {
        name: name.to_string(),
        number: number.unwrap_or_else(random_company_number),
        industry,
        region: region.unwrap_or_else(|| "北京市".to_string()),
        registration_date: None,
    };
    let year = year.unwrap_or(config.carbon.default_year);

    let payload = build_dataset(&company, year, &config.carbon);

    let report = validators::validate_payload(&payload);
    print_validation_report(&report);
    if !report.is_valid() {
        return Err(
            IbotError::Precondition("generated dataset failed validation".to_string()).into(),
        );
    }

    write_dataset(output, &payload).await?;
    println!(
        "{}",
        format!(
            "Wrote dataset to {} ({} daily records, {} satellite observations)",
            output.display(),
            payload.daily_data.len(),
            payload.satellite_data.len()
        )
        .green()
    );
    Ok(())
}

async fn validate_file(path: &Path) -> Result<()> {
    let payload = read_payload(path).await?;
    let report = validators::validate_payload(&payload);
    print_validation_report(&report);

    if report.is_valid() {
        println!("{}", "Dataset is valid.".green());
        Ok(())
    } else {
        Err(IbotError::Precondition("dataset failed validation".to_string()).into())
    }
}

async fn import_file(config: &Config, path: &Path, user: Option<i64>) -> Result<()> {
    let mut payload = read_payload(path).await?;

    let report = validators::validate_payload(&payload);
    print_validation_report(&report);
    if !report.is_valid() {
        return Err(
            IbotError::Precondition("dataset failed validation; import refused".to_string())
                .into(),
        );
    }

    if let Some(user_id) = user.or(config.carbon.user_id) {
        payload.user_id = Some(user_id);
    }

    let api = ApiClient::new(&config.api)?;
    let summary = api.import_carbon_data(&payload).await?;
    print_import_summary(&summary);
    Ok(())
}

/// Generate the four data sections with the configured satellite cluster.
fn build_dataset(company: &CompanyInfo, year: i32, carbon: &CarbonConfig) -> DataImportPayload {
    DataImportPayload {
        daily_data: generators::generate_daily_data(&company.number, company.industry, year),
        scope2: generators::generate_scope2_data(&company.number, year),
        scope3: generators::generate_scope3_data(
            &company.number,
            &company.name,
            company.industry,
            year,
        ),
        satellite_data: generators::generate_satellite_data(
            &company.number,
            carbon.center_latitude,
            carbon.center_longitude,
            carbon.satellite_count,
        ),
        company: company.clone(),
        user_id: None,
    }
}

async fn read_payload(path: &Path) -> Result<DataImportPayload> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| IbotError::Precondition(format!("cannot read {}: {}", path.display(), e)))?;

    let payload = serde_json::from_str(&content).map_err(|e| {
        IbotError::Precondition(format!("{} is not a valid dataset: {}", path.display(), e))
    })?;

    Ok(payload)
}

async fn write_dataset(path: &Path, payload: &DataImportPayload) -> Result<()> {
    let json = serde_json::to_string_pretty(payload).map_err(IbotError::Serialization)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

fn prompt_company(
    rl: &mut DefaultEditor,
    config: &Config,
) -> Result<Option<(CompanyInfo, i32)>> {
    let Some(name) = prompt_required(rl, "Company name: ")? else {
        return Ok(None);
    };
    let default_number = random_company_number();
    let Some(number) = prompt_with_default(rl, "Registration number", &default_number)? else {
        return Ok(None);
    };
    let Some(region) = prompt_with_default(rl, "Region", "北京市")? else {
        return Ok(None);
    };
    let Some(industry) = prompt_industry(rl)? else {
        return Ok(None);
    };
    let Some(registration_date) =
        prompt_date(rl, "Registration date (YYYY-MM-DD, empty to skip): ")?
    else {
        return Ok(None);
    };
    let Some(year) = prompt_year(rl, config.carbon.default_year)? else {
        return Ok(None);
    };

    Ok(Some((
        CompanyInfo {
            name,
            number,
            industry,
            region,
            registration_date,
        },
        year,
    )))
}

fn prompt_industry(rl: &mut DefaultEditor) -> Result<Option<Industry>> {
    println!("Industries:");
    for (index, industry) in Industry::all().iter().enumerate() {
        println!("  {}. {} ({})", index + 1, industry.label(), industry.slug());
    }

    loop {
        let Some(line) = read_line(rl, "Industry number or slug: ")? else {
            return Ok(None);
        };
        let trimmed = line.trim();

        if let Ok(pick) = trimmed.parse::<usize>() {
            if (1..=Industry::all().len()).contains(&pick) {
                return Ok(Some(Industry::all()[pick - 1]));
            }
            println!(
                "{}",
                format!("Enter a number between 1 and {}", Industry::all().len()).yellow()
            );
            continue;
        }

        match trimmed.parse::<Industry>() {
            Ok(industry) => return Ok(Some(industry)),
            Err(e) => println!("{}", e.to_string().yellow()),
        }
    }
}

fn prompt_required(rl: &mut DefaultEditor, label: &str) -> Result<Option<String>> {
    loop {
        let Some(line) = read_line(rl, label)? else {
            return Ok(None);
        };
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
        println!("{}", "A value is required".yellow());
    }
}

fn prompt_with_default(
    rl: &mut DefaultEditor,
    label: &str,
    default: &str,
) -> Result<Option<String>> {
    let Some(line) = read_line(rl, &format!("{} [{}]: ", label, default))? else {
        return Ok(None);
    };
    let trimmed = line.trim();
    Ok(Some(if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }))
}

fn prompt_optional(rl: &mut DefaultEditor, label: &str) -> Result<Option<Option<String>>> {
    let Some(line) = read_line(rl, label)? else {
        return Ok(None);
    };
    let trimmed = line.trim();
    Ok(Some(if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }))
}

fn prompt_date(rl: &mut DefaultEditor, label: &str) -> Result<Option<Option<NaiveDate>>> {
    loop {
        let Some(line) = read_line(rl, label)? else {
            return Ok(None);
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Some(None));
        }
        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => return Ok(Some(Some(date))),
            Err(_) => println!("{}", "Enter a date as YYYY-MM-DD".yellow()),
        }
    }
}

fn prompt_year(rl: &mut DefaultEditor, default: i32) -> Result<Option<i32>> {
    loop {
        let Some(line) = read_line(rl, &format!("Reporting year [{}]: ", default))? else {
            return Ok(None);
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Some(default));
        }
        match trimmed.parse::<i32>() {
            Ok(year) if (2000..=2100).contains(&year) => return Ok(Some(year)),
            _ => println!("{}", "Enter a year between 2000 and 2100".yellow()),
        }
    }
}

fn prompt_yes_no(rl: &mut DefaultEditor, label: &str, default: bool) -> Result<Option<bool>> {
    loop {
        let Some(line) = read_line(rl, label)? else {
            return Ok(None);
        };
        match parse_yes_no(&line, default) {
            Some(answer) => return Ok(Some(answer)),
            None => println!("{}", "Answer y or n".yellow()),
        }
    }
}

fn parse_yes_no(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ok(Some(line)) for input, Ok(None) when the user aborts with Ctrl+C
/// or Ctrl+D.
fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn aborted() -> Result<()> {
    println!("\nAborted.");
    Ok(())
}

/// An 18-digit registration number, the length of a Chinese unified
/// social credit code.
fn random_company_number() -> String {
    let mut rng = rand::rng();
    (0..18)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

fn print_review(payload: &DataImportPayload) {
    let scope3_total = payload
        .scope3
        .total
        .map(|total| format!("{:.2} tCO2e", total))
        .unwrap_or_else(|| "not computed".to_string());

    println!("\n{}", "Dataset summary".bold());
    println!(
        "  Company:    {} ({})",
        payload.company.name, payload.company.industry
    );
    println!("  Number:     {}", payload.company.number);
    println!("  Region:     {}", payload.company.region);
    println!("  Daily:      {} records", payload.daily_data.len());
    println!(
        "  Scope 2:    {:.0} kWh in {}",
        payload.scope2.electricity_consumption_kwh, payload.scope2.year
    );
    println!(
        "  Scope 3:    {} dimensions, total {}",
        payload.scope3.dimensions.len(),
        scope3_total
    );
    println!("  Satellite:  {} observations", payload.satellite_data.len());
    println!();
}

fn print_validation_report(report: &ValidationReport) {
    for error in &report.errors {
        eprintln!("{}", format!("error: {}", error).red());
    }
    for warning in &report.warnings {
        println!("{}", format!("warning: {}", warning).yellow());
    }
}

fn print_import_summary(summary: &ImportSummary) {
    println!("\n{}", "Import complete".green().bold());
    println!("  Company:            {}", summary.company);
    println!("  Daily records:      {}", summary.daily_records);
    println!("  Scope 2 records:    {}", summary.scope2_records);
    println!("  Scope 3 dimensions: {}", summary.scope3_dimensions);
    println!("  Satellite records:  {}", summary.satellite_records);
    println!();
}

fn print_wizard_banner() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    ibot Carbon Data Wizard                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Six steps: company, daily records, scope 2, scope 3, satellite, review.");
    println!("Press Ctrl+C at any prompt to abort.\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_company() -> CompanyInfo {
        CompanyInfo {
            name: "测试电力公司".to_string(),
            number: "911100001234567890".to_string(),
            industry: Industry::Power,
            region: "北京市".to_string(),
            registration_date: None,
        }
    }

    #[test]
    fn test_missing_sections_lists_every_gap() {
        let draft = DraftDataset::default();
        let missing = draft.missing_sections();
        assert_eq!(missing.len(), 5);
        assert!(missing.contains(&"company info"));
        assert!(missing.contains(&"satellite data"));
    }

    #[test]
    fn test_missing_sections_empty_when_complete() {
        let company = sample_company();
        let draft = DraftDataset {
            daily: generators::generate_daily_data(&company.number, company.industry, 2024),
            scope2: Some(generators::generate_scope2_data(&company.number, 2024)),
            scope3: Some(generators::generate_scope3_data(
                &company.number,
                &company.name,
                company.industry,
                2024,
            )),
            satellite: generators::generate_satellite_data(&company.number, 39.9, 116.4, 10),
            company: Some(company),
        };
        assert!(draft.missing_sections().is_empty());

        let payload = draft.into_payload(Some(7)).unwrap();
        assert_eq!(payload.user_id, Some(7));
        assert_eq!(payload.satellite_data.len(), 10);
    }

    #[test]
    fn test_into_payload_requires_all_sections() {
        assert!(DraftDataset::default().into_payload(None).is_none());
    }

    #[test]
    fn test_build_dataset_honors_config() {
        let company = sample_company();
        let carbon = CarbonConfig {
            satellite_count: 5,
            ..CarbonConfig::default()
        };

        let payload = build_dataset(&company, 2024, &carbon);
        assert_eq!(payload.satellite_data.len(), 5);
        assert_eq!(payload.company.number, company.number);
        assert_eq!(payload.scope3.year, 2024);
        assert!(payload.user_id.is_none());
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("", true), Some(true));
        assert_eq!(parse_yes_no("", false), Some(false));
        assert_eq!(parse_yes_no("y", false), Some(true));
        assert_eq!(parse_yes_no("YES", false), Some(true));
        assert_eq!(parse_yes_no("n", true), Some(false));
        assert_eq!(parse_yes_no("no", true), Some(false));
        assert_eq!(parse_yes_no("maybe", true), None);
    }

    #[test]
    fn test_random_company_number_shape() {
        let number = random_company_number();
        assert_eq!(number.len(), 18);
        assert!(number.chars().all(|c| c.is_ascii_digit()));
    }
}
