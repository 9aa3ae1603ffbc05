use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use crate::config::Endpoint;

/// Annual rainfall for one state (optionally one district) and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallRecord {
    #[serde(alias = "state_name", alias = "subdivision")]
    pub state: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(deserialize_with = "lenient::year")]
    pub year: i32,
    #[serde(alias = "annual", deserialize_with = "lenient::number")]
    pub annual_rainfall_mm: f64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub monsoon_rainfall_mm: Option<f64>,
}

/// State-level production of one crop in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    #[serde(alias = "state_name")]
    pub state: String,
    #[serde(alias = "crop_name")]
    pub crop: String,
    #[serde(alias = "crop_year", deserialize_with = "lenient::year")]
    pub year: i32,
    #[serde(alias = "production", deserialize_with = "lenient::number")]
    pub production_tonnes: f64,
    #[serde(default, alias = "area", deserialize_with = "lenient::opt_number")]
    pub area_hectares: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub yield_kg_per_hectare: Option<f64>,
}

/// District-level production of one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    #[serde(alias = "state_name")]
    pub state: String,
    #[serde(alias = "district_name")]
    pub district: String,
    #[serde(alias = "crop_name")]
    pub crop: String,
    #[serde(alias = "crop_year", deserialize_with = "lenient::year")]
    pub year: i32,
    #[serde(alias = "production", deserialize_with = "lenient::number")]
    pub production_tonnes: f64,
}

/// Column access used by the generic summaries and charts.
pub trait Tabular: Serialize {
    /// Column names in display order.
    const COLUMNS: &'static [&'static str];
    /// The column summed or averaged when nothing more specific is asked.
    const PRIMARY_METRIC: &'static str;

    /// Numeric columns in declaration order; `None` for missing values.
    fn numeric_values(&self) -> Vec<(&'static str, Option<f64>)>;

    /// The categorical column charts group by.
    fn category(&self) -> &str;

    fn primary_value(&self) -> f64;
}

impl Tabular for RainfallRecord {
    const COLUMNS: &'static [&'static str] = &[
        "state",
        "district",
        "year",
        "annual_rainfall_mm",
        "monsoon_rainfall_mm",
    ];
    const PRIMARY_METRIC: &'static str = "annual_rainfall_mm";

    fn numeric_values(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("year", Some(f64::from(self.year))),
            ("annual_rainfall_mm", Some(self.annual_rainfall_mm)),
            ("monsoon_rainfall_mm", self.monsoon_rainfall_mm),
        ]
    }

    fn category(&self) -> &str {
        &self.state
    }

    fn primary_value(&self) -> f64 {
        self.annual_rainfall_mm
    }
}

impl Tabular for ProductionRecord {
    const COLUMNS: &'static [&'static str] = &[
        "state",
        "crop",
        "year",
        "production_tonnes",
        "area_hectares",
        "yield_kg_per_hectare",
    ];
    const PRIMARY_METRIC: &'static str = "production_tonnes";

    fn numeric_values(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("year", Some(f64::from(self.year))),
            ("production_tonnes", Some(self.production_tonnes)),
            ("area_hectares", self.area_hectares),
            ("yield_kg_per_hectare", self.yield_kg_per_hectare),
        ]
    }

    fn category(&self) -> &str {
        &self.state
    }

    fn primary_value(&self) -> f64 {
        self.production_tonnes
    }
}

impl Tabular for DistrictRecord {
    const COLUMNS: &'static [&'static str] =
        &["state", "district", "crop", "year", "production_tonnes"];
    const PRIMARY_METRIC: &'static str = "production_tonnes";

    fn numeric_values(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("year", Some(f64::from(self.year))),
            ("production_tonnes", Some(self.production_tonnes)),
        ]
    }

    fn category(&self) -> &str {
        &self.district
    }

    fn primary_value(&self) -> f64 {
        self.production_tonnes
    }
}

/// One API answer plus the request metadata, exactly as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Raw JSON body (normally an object with a `records` array).
    pub data: Value,
    pub endpoint: Endpoint,
    pub url: String,
    /// Request parameters, without the API key.
    pub parameters: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    pub records_count: usize,
}

impl ApiResponse {
    pub fn new(endpoint: Endpoint, url: String, parameters: BTreeMap<String, String>, data: Value) -> Self {
        let records_count = raw_records(&data).len();
        Self {
            data,
            endpoint,
            url,
            parameters,
            timestamp: Utc::now(),
            records_count,
        }
    }

    pub fn records(&self) -> &[Value] {
        raw_records(&self.data)
    }

    /// Deserializes every record, skipping the ones that don't fit `T`.
    pub fn parse_records<T: DeserializeOwned>(&self) -> Vec<T> {
        let records = self.records();
        let mut parsed = Vec::with_capacity(records.len());
        for (index, raw) in records.iter().enumerate() {
            match serde_json::from_value::<T>(raw.clone()) {
                Ok(record) => parsed.push(record),
                Err(e) => warn!("Skipping {} record #{}: {}", self.endpoint, index, e),
            }
        }
        parsed
    }
}

fn raw_records(data: &Value) -> &[Value] {
    match data {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("records")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// Where a fetch result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    /// Fresh answer from the live API.
    Live,
    /// Unexpired cache entry.
    Cache,
    /// Expired cache entry used because the live call failed.
    StaleCache,
    /// Synthetic data.
    Demo,
}

impl FetchSource {
    pub fn label(&self) -> &'static str {
        match self {
            FetchSource::Live => "live",
            FetchSource::Cache => "cache",
            FetchSource::StaleCache => "stale cache",
            FetchSource::Demo => "demo",
        }
    }
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of the fetch chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub response: ApiResponse,
    pub source: FetchSource,
}

/// Attribution for the data behind an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub name: String,
    pub endpoint: Endpoint,
    pub url: String,
    pub parameters: Value,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub provider: String,
    pub demo: bool,
}

impl SourceCitation {
    /// One-line rendering for terminal output.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) - {}{}",
            self.name,
            self.provider,
            self.url,
            if self.demo { " [demo data]" } else { "" }
        )
    }
}

/// Parsed records of one fetch, with their citation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset<T> {
    pub records: Vec<T>,
    pub citation: SourceCitation,
    pub source: FetchSource,
}

impl<T> Dataset<T> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Deserializers tolerant of the API's habit of sending numbers as strings.
mod lenient {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    fn to_f64(raw: Raw) -> Option<f64> {
        let value: Option<f64> = match raw {
            Raw::Num(n) => Some(n),
            Raw::Text(s) => s.trim().replace(',', "").parse().ok(),
        };
        value.filter(|v| v.is_finite())
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        to_f64(Raw::deserialize(deserializer)?)
            .ok_or_else(|| de::Error::custom("expected a numeric value"))
    }

    pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Raw> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(to_f64))
    }

    /// Accepts `2019`, `"2019"` and crop years such as `"2019-20"`.
    pub fn year<'de, D>(deserializer: D) -> Result<i32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let year = match Raw::deserialize(deserializer)? {
            Raw::Num(n) if n.fract() == 0.0 => Some(n as i32),
            Raw::Num(_) => None,
            Raw::Text(s) => {
                let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
                if digits.len() == 4 {
                    digits.parse().ok()
                } else {
                    None
                }
            }
        };
        year.filter(|y| (1800..=2200).contains(y))
            .ok_or_else(|| de::Error::custom("expected a four-digit year"))
    }
}
