//! Carbon Dataset Generation Example
//!
//! This example demonstrates how to use the carbon module to:
//! 1. Describe a company with one of the supported industries
//! 2. Generate a complete synthetic dataset for a reporting year
//! 3. Validate the dataset with the same checks the CLI runs
//! 4. Write the result to a JSON file ready for `ibot carbon import`
//!
//! # Running
//!
//! ```bash
//! cargo run --example generate_dataset
//! ```
//!
//! The dataset lands in `demo_dataset.json` in the current directory.
//! Import it against a running backend with:
//! ```bash
//! ibot carbon import --file demo_dataset.json
//! ```

use ibot::carbon::generators::generate_complete;
use ibot::carbon::validators::validate_payload;
use ibot::carbon::{CompanyInfo, Industry};

/// Reporting year for the generated dataset.
const YEAR: i32 = 2024;

/// Output path for the generated dataset.
const OUTPUT: &str = "demo_dataset.json";

fn main() -> anyhow::Result<()> {
    let company = CompanyInfo {
        name: "示例新能源有限公司".to_string(),
        number: "911100009876543210".to_string(),
        industry: Industry::Power,
        region: "北京市".to_string(),
        registration_date: None,
    };

    println!(
        "Generating dataset for {} ({}), year {}",
        company.name,
        company.industry.slug(),
        YEAR
    );
    let payload = generate_complete(&company, YEAR);

    println!(
        "  {} daily records, {} scope-3 dimensions, {} satellite observations",
        payload.daily_data.len(),
        payload.scope3.dimensions.len(),
        payload.satellite_data.len()
    );

    let report = validate_payload(&payload);
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    if !report.is_valid() {
        for error in &report.errors {
            eprintln!("  error: {}", error);
        }
        anyhow::bail!("generated dataset failed validation");
    }

    std::fs::write(OUTPUT, serde_json::to_string_pretty(&payload)?)?;
    println!("Wrote {}", OUTPUT);
    Ok(())
}
