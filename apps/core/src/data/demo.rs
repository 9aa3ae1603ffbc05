//! Synthetic data shaped like data.gov.in responses.
//!
//! Used when no API key is configured, or when the live API fails and there
//! is no cache to fall back on. Output is deterministic for a given request.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::{ApiQuery, Endpoint};
use crate::models::ApiResponse;

const DEMO_YEARS: std::ops::RangeInclusive<i32> = 2018..=2023;
const BASE_YEAR: i32 = 2018;

const RAINFALL_STATES: &[&str] = &["Punjab", "Haryana"];
const PRODUCTION_STATES: &[&str] = &["Punjab", "Haryana", "Maharashtra"];
const PRODUCTION_CROPS: &[&str] = &["Rice", "Wheat", "Cotton", "Sugarcane", "Maize"];
const DISTRICT_STATE: &str = "Uttar Pradesh";
const DISTRICT_CROPS: &[&str] = &["Wheat", "Rice", "Sugarcane", "Potato"];
const DISTRICT_COUNT: usize = 5;
const DISTRICT_YEAR: i32 = 2023;

pub struct DemoData;

impl DemoData {
    /// Builds a demo response for `endpoint`, honouring the state, crop and
    /// year filters of `query`.
    pub fn generate(endpoint: Endpoint, query: &ApiQuery) -> ApiResponse {
        info!("Generating demo data for {}", endpoint);

        let records = match endpoint {
            Endpoint::ImdRainfall => rainfall(query),
            Endpoint::AgricultureProduction => production(query),
            Endpoint::DistrictWiseCrops => districts(query),
            Endpoint::CropYield => Vec::new(),
        };

        ApiResponse::new(
            endpoint,
            format!("demo://{}", endpoint.key()),
            query.filters.clone(),
            json!({ "records": records }),
        )
    }
}

fn rainfall(query: &ApiQuery) -> Vec<Value> {
    let states = list_or(query, "state", RAINFALL_STATES);
    let years = years_or_default(query);

    let mut records = Vec::with_capacity(states.len() * years.len());
    for state in &states {
        let base = if state == "Punjab" { 1200.0 } else { 1100.0 };
        let offset = jitter(state, 200) as f64 - 100.0;
        for &year in &years {
            records.push(json!({
                "state": state,
                "year": year,
                "annual_rainfall_mm": base + f64::from(year - BASE_YEAR) * 50.0 + offset,
                "monsoon_rainfall_mm": base * 0.7,
                "district": format!("{}_District_1", state),
            }));
        }
    }
    records
}

fn production(query: &ApiQuery) -> Vec<Value> {
    let states = list_or(query, "state", PRODUCTION_STATES);
    let crops = list_or(query, "crop", PRODUCTION_CROPS);
    let years = years_or_default(query);

    let mut records = Vec::with_capacity(states.len() * crops.len() * years.len());
    for state in &states {
        for crop in &crops {
            let offset = jitter(&format!("{}{}", state, crop), 1000) as f64;
            for &year in &years {
                let production = crop_base(crop) + f64::from(year - BASE_YEAR) * 200.0 + offset;
                records.push(json!({
                    "state": state,
                    "crop": crop,
                    "year": year,
                    "production_tonnes": production,
                    "area_hectares": production / 2.5,
                    "yield_kg_per_hectare": 2500.0,
                }));
            }
        }
    }
    records
}

fn districts(query: &ApiQuery) -> Vec<Value> {
    let state = query
        .filter_list("state")
        .into_iter()
        .next()
        .unwrap_or_else(|| DISTRICT_STATE.to_string());
    let crops = list_or(query, "crop", DISTRICT_CROPS);

    let mut records = Vec::with_capacity(DISTRICT_COUNT * crops.len());
    for i in 1..=DISTRICT_COUNT {
        let district = format!("{}_District_{}", state, i);
        for crop in &crops {
            records.push(json!({
                "state": state,
                "district": district,
                "crop": crop,
                "production_tonnes": 1000.0 + jitter(&format!("{}{}", district, crop), 5000) as f64,
                "year": DISTRICT_YEAR,
            }));
        }
    }
    records
}

fn crop_base(crop: &str) -> f64 {
    match crop {
        "Rice" => 5000.0,
        "Wheat" => 6000.0,
        "Cotton" => 3000.0,
        "Sugarcane" => 8000.0,
        "Maize" => 4000.0,
        _ => 3000.0,
    }
}

fn list_or(query: &ApiQuery, key: &str, default: &[&str]) -> Vec<String> {
    let values = query.filter_list(key);
    if values.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        values
    }
}

fn years_or_default(query: &ApiQuery) -> Vec<i32> {
    let years: Vec<i32> = query
        .filter_list("year")
        .iter()
        .filter_map(|y| y.parse().ok())
        .collect();
    if years.is_empty() {
        DEMO_YEARS.collect()
    } else {
        years
    }
}

/// Deterministic value in `0..modulus` derived from `seed`.
fn jitter(seed: &str, modulus: u64) -> u64 {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes) % modulus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistrictRecord, ProductionRecord, RainfallRecord};

    #[test]
    fn test_rainfall_defaults() {
        let response = DemoData::generate(Endpoint::ImdRainfall, &ApiQuery::default());
        let records: Vec<RainfallRecord> = response.parse_records();

        assert_eq!(records.len(), 2 * 6);
        assert_eq!(response.url, "demo://imd_rainfall");
        assert!(records.iter().all(|r| (2018..=2023).contains(&r.year)));
        let punjab_2018 = records.iter().find(|r| r.state == "Punjab" && r.year == 2018).unwrap();
        assert!((1100.0..1300.0).contains(&punjab_2018.annual_rainfall_mm));
    }

    #[test]
    fn test_rainfall_honours_filters() {
        let query = ApiQuery::default()
            .with_filter("state", "Kerala,Assam")
            .with_filter("year", "2021,2022");
        let records: Vec<RainfallRecord> = DemoData::generate(Endpoint::ImdRainfall, &query).parse_records();

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.state == "Kerala" || r.state == "Assam"));
    }

    #[test]
    fn test_production_grows_each_year() {
        let query = ApiQuery::default()
            .with_filter("state", "Punjab")
            .with_filter("crop", "Wheat");
        let mut records: Vec<ProductionRecord> =
            DemoData::generate(Endpoint::AgricultureProduction, &query).parse_records();
        records.sort_by_key(|r| r.year);

        assert_eq!(records.len(), 6);
        for pair in records.windows(2) {
            assert_eq!(pair[1].production_tonnes - pair[0].production_tonnes, 200.0);
        }
    }

    #[test]
    fn test_district_data_for_requested_state() {
        let query = ApiQuery::default().with_filter("state", "Bihar").with_filter("crop", "Rice");
        let records: Vec<DistrictRecord> = DemoData::generate(Endpoint::DistrictWiseCrops, &query).parse_records();

        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.state == "Bihar" && r.crop == "Rice"));
        assert!(records.iter().all(|r| (1000.0..6000.0).contains(&r.production_tonnes)));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let query = ApiQuery::default();
        let a = DemoData::generate(Endpoint::AgricultureProduction, &query);
        let b = DemoData::generate(Endpoint::AgricultureProduction, &query);
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_unknown_shape_endpoint_is_empty() {
        let response = DemoData::generate(Endpoint::CropYield, &ApiQuery::default());
        assert_eq!(response.records_count, 0);
    }
}
