//! Client-side validation of the intake bundle.
//!
//! These checks run before submission so obviously bad data never reaches
//! the backend. Errors block submission; warnings flag departures from the
//! expected record counts without blocking.

use std::collections::HashSet;

use super::{
    CompanyInfo, DailyData, DataImportPayload, SatelliteData, Scope2Data, Scope3Data,
    DAILY_RECORD_COUNT, SATELLITE_MINIMUM_COUNT, SCOPE3_DIMENSION_COUNT,
};

/// Outcome of one validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another report in, prefixing its messages with a section name.
    fn absorb(&mut self, section: &str, other: ValidationReport) {
        self.errors
            .extend(other.errors.into_iter().map(|e| format!("{section}: {e}")));
        self.warnings
            .extend(other.warnings.into_iter().map(|w| format!("{section}: {w}")));
    }
}

/// Validate company master data: all identifying fields must be non-blank.
pub fn validate_company_info(company: &CompanyInfo) -> ValidationReport {
    let mut report = ValidationReport::default();
    if company.name.trim().is_empty() {
        report.error("company name must not be empty");
    }
    if company.number.trim().is_empty() {
        report.error("company number must not be empty");
    }
    if company.region.trim().is_empty() {
        report.error("region must not be empty");
    }
    report
}

/// Validate the daily scope-1 records.
///
/// Each record's measurements must be finite and within plausible physical
/// ranges; dates must be unique. A count other than one-per-leap-year-day
/// is a warning, not an error.
pub fn validate_daily_data(records: &[DailyData]) -> ValidationReport {
    let mut report = ValidationReport::default();

    if records.is_empty() {
        report.error("daily records must not be empty");
        return report;
    }
    if records.len() != DAILY_RECORD_COUNT {
        report.warn(format!(
            "expected {DAILY_RECORD_COUNT} daily records, found {}",
            records.len()
        ));
    }

    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        check_range(
            &mut report,
            row,
            "background value",
            record.background_ppm,
            0.0,
            1000.0,
            "ppm",
        );
        check_range(
            &mut report,
            row,
            "peak value",
            record.peak_ppm,
            0.0,
            1000.0,
            "ppm",
        );
        if record.peak_ppm < record.background_ppm {
            report.error(format!("record {row}: peak value below background value"));
        }
        check_range(
            &mut report,
            row,
            "wind speed",
            record.wind_speed,
            0.0,
            50.0,
            "m/s",
        );
        check_range(
            &mut report,
            row,
            "downwind distance",
            record.downwind_distance,
            0.0,
            10000.0,
            "m",
        );
    }

    let unique_dates: HashSet<_> = records.iter().map(|r| r.date).collect();
    if unique_dates.len() != records.len() {
        report.error("daily records contain duplicate dates");
    }

    report
}

/// Validate annual electricity data.
pub fn validate_scope2_data(data: &Scope2Data) -> ValidationReport {
    let mut report = ValidationReport::default();
    if data.year == 0 {
        report.error("year must be set");
    }
    if !data.electricity_consumption_kwh.is_finite() {
        report.error("electricity consumption is not a number");
    } else if data.electricity_consumption_kwh < 0.0 {
        report.error("electricity consumption must not be negative");
    } else if data.electricity_consumption_kwh > 100_000_000.0 {
        report.error("electricity consumption out of range (0-100,000,000 kWh)");
    }
    report
}

/// Validate the scope-3 report: exactly four dimensions, each with a
/// non-negative emission value inside the accepted bound.
pub fn validate_scope3_data(data: &Scope3Data) -> ValidationReport {
    let mut report = ValidationReport::default();
    if data.year == 0 {
        report.error("year must be set");
    }
    if data.dimensions.is_empty() {
        report.error("emission dimensions must not be empty");
        return report;
    }
    if data.dimensions.len() != SCOPE3_DIMENSION_COUNT {
        report.error(format!(
            "expected {SCOPE3_DIMENSION_COUNT} emission dimensions, found {}",
            data.dimensions.len()
        ));
        return report;
    }
    for (index, dimension) in data.dimensions.iter().enumerate() {
        let row = index + 1;
        match dimension.emission_value {
            None => report.error(format!("dimension {row}: emission value must be set")),
            Some(value) if !value.is_finite() => {
                report.error(format!("dimension {row}: emission value is not a number"));
            }
            Some(value) if value < 0.0 => {
                report.error(format!("dimension {row}: emission value must not be negative"));
            }
            Some(value) if value > 1_000_000.0 => {
                report.error(format!(
                    "dimension {row}: emission value out of range (0-1,000,000 tCO₂)"
                ));
            }
            Some(_) => {}
        }
    }
    report
}

/// Validate satellite observations: coordinates and concentration must be
/// within their physical ranges. Fewer than the recommended minimum count
/// is a warning.
pub fn validate_satellite_data(records: &[SatelliteData]) -> ValidationReport {
    let mut report = ValidationReport::default();

    if records.is_empty() {
        report.error("satellite records must not be empty");
        return report;
    }
    if records.len() < SATELLITE_MINIMUM_COUNT {
        report.warn(format!(
            "at least {SATELLITE_MINIMUM_COUNT} satellite records recommended, found {}",
            records.len()
        ));
    }

    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        check_range(&mut report, row, "latitude", record.latitude, -90.0, 90.0, "°");
        check_range(
            &mut report,
            row,
            "longitude",
            record.longitude,
            -180.0,
            180.0,
            "°",
        );
        check_range(
            &mut report,
            row,
            "CO2 concentration",
            record.co2_concentration,
            0.0,
            1000.0,
            "ppm",
        );
    }

    report
}

/// Validate a complete bundle section by section.
pub fn validate_payload(payload: &DataImportPayload) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.absorb("company", validate_company_info(&payload.company));
    report.absorb("daily data", validate_daily_data(&payload.daily_data));
    report.absorb("scope 2", validate_scope2_data(&payload.scope2));
    report.absorb("scope 3", validate_scope3_data(&payload.scope3));
    report.absorb(
        "satellite data",
        validate_satellite_data(&payload.satellite_data),
    );
    report
}

fn check_range(
    report: &mut ValidationReport,
    row: usize,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
    unit: &str,
) {
    if !value.is_finite() {
        report.error(format!("record {row}: {field} is not a number"));
    } else if value < min || value > max {
        report.error(format!(
            "record {row}: {field} out of range ({min}-{max} {unit})"
        ));
    }
}
