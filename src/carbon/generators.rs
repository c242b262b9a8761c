//! Synthetic demo-data generation.
//!
//! Fills wizard steps with plausible values so a complete bundle can be
//! produced without manual entry. Value ranges mirror what the ingestion
//! backend considers reasonable; the validators accept everything produced
//! here.

use chrono::{Days, NaiveDate, NaiveTime};
use rand::Rng;

use super::{
    daily_emissions, round_to, scope2_emissions, CompanyInfo, DailyData, DataImportPayload,
    Industry, SatelliteData, Scope2Data, Scope3Data, Scope3Dimension, Scope3Variable,
    DAILY_RECORD_COUNT, GRID_EMISSION_FACTOR, K_CONSTANT, SATELLITE_MINIMUM_COUNT,
};

/// Default satellite observation center (Beijing).
pub const DEFAULT_CENTER_LATITUDE: f64 = 39.9;
pub const DEFAULT_CENTER_LONGITUDE: f64 = 116.4;

/// Consecutive dates starting January 1st of `year`.
fn date_range(year: i32, days: usize) -> Vec<NaiveDate> {
    let Some(start) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };
    (0..days)
        .filter_map(|offset| start.checked_add_days(Days::new(offset as u64)))
        .collect()
}

fn random_in_range<R: Rng>(rng: &mut R, min: f64, max: f64, decimals: u32) -> f64 {
    round_to(rng.random_range(min..=max), decimals)
}

/// Generate a full leap year of daily scope-1 records.
///
/// The company parameter A is drawn once and shared by all records; the
/// sector parameter C comes from the industry table.
pub fn generate_daily_data(
    company_number: &str,
    industry: Industry,
    year: i32,
) -> Vec<DailyData> {
    let mut rng = rand::rng();
    let c_sector = industry.c_sector();
    let company_parameter = random_in_range(&mut rng, 0.5, 2.0, 3);

    date_range(year, DAILY_RECORD_COUNT)
        .into_iter()
        .map(|date| {
            let background_ppm = random_in_range(&mut rng, 400.0, 420.0, 2);
            let peak_ppm = random_in_range(&mut rng, 425.0, 450.0, 2);
            let peak_minus_background = round_to(peak_ppm - background_ppm, 2);
            let wind_speed = random_in_range(&mut rng, 2.0, 8.0, 2);
            let downwind_distance = random_in_range(&mut rng, 500.0, 2000.0, 1);
            let emissions = daily_emissions(
                peak_minus_background,
                wind_speed,
                downwind_distance,
                c_sector,
                company_parameter,
            );

            DailyData {
                id: None,
                company_number: company_number.to_string(),
                date,
                background_ppm,
                peak_ppm,
                peak_minus_background: Some(peak_minus_background),
                wind_speed,
                downwind_distance,
                sector_parameter: Some(c_sector),
                k_constant: Some(K_CONSTANT),
                company_parameter: Some(company_parameter),
                daily_emissions: Some(emissions),
            }
        })
        .collect()
}

/// Generate satellite CO₂ observations scattered around a center point.
///
/// Observation dates are drawn at random from the 2024 calendar;
/// coordinates stay within ±0.1° of the center.
pub fn generate_satellite_data(
    company_number: &str,
    center_latitude: f64,
    center_longitude: f64,
    count: usize,
) -> Vec<SatelliteData> {
    let mut rng = rand::rng();
    let dates = date_range(2024, DAILY_RECORD_COUNT);
    if dates.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let date = dates[rng.random_range(0..dates.len())];
            let latitude = center_latitude + random_in_range(&mut rng, -0.1, 0.1, 6);
            let longitude = center_longitude + random_in_range(&mut rng, -0.1, 0.1, 6);
            let co2_concentration = random_in_range(&mut rng, 410.0, 450.0, 2);
            let hour: u32 = rng.random_range(0..24);
            let minute: u32 = rng.random_range(0..60);

            SatelliteData {
                id: None,
                company_number: company_number.to_string(),
                observation_date: date,
                latitude,
                longitude,
                co2_concentration,
                observation_time: NaiveTime::from_hms_opt(hour, minute, 0),
            }
        })
        .collect()
}

/// Per-industry value ranges for scope-3 activity data and factors.
fn scope3_value_ranges(industry: Industry) -> (f64, f64, f64, f64) {
    match industry {
        Industry::Finance => (1_000.0, 100_000.0, 0.001, 0.01),
        Industry::Power => (50_000.0, 300_000.0, 0.5, 3.0),
        Industry::Manufacturing => (5_000.0, 200_000.0, 0.5, 3.0),
        Industry::Aviation => (10_000.0, 100_000.0, 2.0, 5.0),
        _ => (100.0, 10_000.0, 0.5, 5.0),
    }
}

/// Generate the four scope-3 dimensions for an industry.
///
/// Each dimension gets two or three variables: the activity value, the
/// emission factor, and optionally an amortization coefficient that scales
/// the result down.
pub fn generate_scope3_data(
    company_number: &str,
    company_name: &str,
    industry: Industry,
    year: i32,
) -> Scope3Data {
    let mut rng = rand::rng();
    let (min_base, max_base, min_factor, max_factor) = scope3_value_ranges(industry);

    let dimensions: Vec<Scope3Dimension> = industry
        .scope3_template()
        .into_iter()
        .map(|entry| {
            let base_value = random_in_range(&mut rng, min_base, max_base, 2);
            let factor = random_in_range(&mut rng, min_factor, max_factor, 3);
            let mut variables = vec![
                Scope3Variable {
                    name: activity_variable_name(entry.dimension).to_string(),
                    value: base_value,
                    unit: activity_unit(entry.dimension).to_string(),
                },
                Scope3Variable {
                    name: "排放因子".to_string(),
                    value: factor,
                    unit: "tCO₂e/单位".to_string(),
                },
            ];

            let mut emission_value = base_value * factor;
            let variable_count: u32 = rng.random_range(2..=3);
            if variable_count == 3 {
                let coefficient = random_in_range(&mut rng, 0.1, 1.0, 2);
                variables.push(Scope3Variable {
                    name: "摊销系数".to_string(),
                    value: coefficient,
                    unit: String::new(),
                });
                emission_value *= coefficient;
            }

            Scope3Dimension {
                dimension: entry.dimension.to_string(),
                emission_type: entry.category.to_string(),
                variables,
                formula: entry.formula.to_string(),
                explanation: Some(entry.explanation.to_string()),
                emission_value: Some(round_to(emission_value, 2)),
            }
        })
        .collect();

    let total: f64 = dimensions
        .iter()
        .filter_map(|d| d.emission_value)
        .sum();

    Scope3Data {
        id: None,
        company_number: company_number.to_string(),
        company_name: company_name.to_string(),
        industry,
        year,
        dimensions,
        total: Some(round_to(total, 2)),
    }
}

/// Generate annual electricity data with the grid-average factor.
pub fn generate_scope2_data(company_number: &str, year: i32) -> Scope2Data {
    let mut rng = rand::rng();
    let consumption = random_in_range(&mut rng, 100_000.0, 10_000_000.0, 0);
    Scope2Data {
        id: None,
        company_number: company_number.to_string(),
        year,
        electricity_consumption_kwh: consumption,
        emission_factor: Some(GRID_EMISSION_FACTOR),
        scope2_emissions: Some(scope2_emissions(consumption, GRID_EMISSION_FACTOR)),
    }
}

/// Generate a complete, validation-clean bundle for one company.
pub fn generate_complete(company: &CompanyInfo, year: i32) -> DataImportPayload {
    DataImportPayload {
        daily_data: generate_daily_data(&company.number, company.industry, year),
        scope2: generate_scope2_data(&company.number, year),
        scope3: generate_scope3_data(&company.number, &company.name, company.industry, year),
        satellite_data: generate_satellite_data(
            &company.number,
            DEFAULT_CENTER_LATITUDE,
            DEFAULT_CENTER_LONGITUDE,
            SATELLITE_MINIMUM_COUNT,
        ),
        company: company.clone(),
        user_id: None,
    }
}

/// Activity variable name for a dimension, keyed off its wording.
fn activity_variable_name(dimension: &str) -> &'static str {
    if dimension.contains("燃油") || dimension.contains("能源") {
        "消耗量"
    } else if dimension.contains("采购") || dimension.contains("供应链") {
        "采购支出"
    } else if dimension.contains("租赁") || dimension.contains("资产") {
        "租赁面积"
    } else if dimension.contains("通勤") || dimension.contains("差旅") {
        "活动人公里"
    } else if dimension.contains("制造") || dimension.contains("设备") {
        "采购数量"
    } else if dimension.contains("投资") || dimension.contains("融资") {
        "投资金额"
    } else {
        "活动数据"
    }
}

/// Unit for the activity variable, keyed off the dimension wording.
fn activity_unit(dimension: &str) -> &'static str {
    if dimension.contains("燃油") || dimension.contains("材料") {
        "吨"
    } else if dimension.contains("采购") || dimension.contains("投资") {
        "万元"
    } else if dimension.contains("租赁") || dimension.contains("面积") {
        "平方米"
    } else if dimension.contains("通勤") || dimension.contains("差旅") {
        "人·公里"
    } else if dimension.contains("设备") || dimension.contains("飞机") {
        "台/架"
    } else {
        "单位"
    }
}
