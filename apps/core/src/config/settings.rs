//! Runtime settings and the data.gov.in endpoint catalogue.
//!
//! Settings are read once at startup and passed to the components that need
//! them. Nothing here is global.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use validator::Validate;

use crate::error::AppError;

pub const APP_NAME: &str = "Project Samarth";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BASE_URL: &str = "https://api.data.gov.in/resource/";

/// Value shipped in `.env.example`; treated as "no key configured".
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_RATE_LIMIT_PER_HOUR: usize = 100;
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_LIMIT: usize = 1000;

/// Open-data resources the fetcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    ImdRainfall,
    AgricultureProduction,
    CropYield,
    DistrictWiseCrops,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::ImdRainfall,
        Endpoint::AgricultureProduction,
        Endpoint::CropYield,
        Endpoint::DistrictWiseCrops,
    ];

    /// Stable key used in cache files, CLI flags and citations.
    pub fn key(&self) -> &'static str {
        match self {
            Endpoint::ImdRainfall => "imd_rainfall",
            Endpoint::AgricultureProduction => "agriculture_production",
            Endpoint::CropYield => "crop_yield",
            Endpoint::DistrictWiseCrops => "district_wise_crops",
        }
    }

    pub fn resource_id(&self) -> &'static str {
        match self {
            Endpoint::ImdRainfall => "9ef84268-d588-465a-a308-a864a43d0070",
            Endpoint::AgricultureProduction => "8d6c8e8e-e9cd-4f42-b37a-6d9f9e1e4c7a",
            Endpoint::CropYield => "a8e8c8d9-f3e1-4b5d-9c7e-1a2b3c4d5e6f",
            Endpoint::DistrictWiseCrops => "b7d9f2e3-a1c4-4e8d-b9f2-3c4d5e6f7a8b",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Endpoint::ImdRainfall => "IMD Rainfall Data",
            Endpoint::AgricultureProduction => "Agricultural Production Statistics",
            Endpoint::CropYield => "Crop Yield Data",
            Endpoint::DistrictWiseCrops => "District-wise Crop Production",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Endpoint {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|e| e.key() == s.trim())
            .ok_or_else(|| AppError::UnknownEndpoint(s.to_string()))
    }
}

/// Paging and filter parameters for one API request.
///
/// Filters are kept sorted so that the same logical request always produces
/// the same cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiQuery {
    pub limit: usize,
    pub offset: usize,
    pub filters: BTreeMap<String, String>,
}

impl Default for ApiQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl ApiQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            offset: 0,
            filters: BTreeMap::new(),
        }
    }

    /// Adds a filter; empty values are ignored.
    pub fn with_filter(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.filters.insert(key.to_string(), value);
        }
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Splits a comma-joined filter back into its parts.
    pub fn filter_list(&self, key: &str) -> Vec<String> {
        self.filter(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    /// data.gov.in API key. `None` puts the fetcher in demo mode.
    pub api_key: Option<String>,
    #[validate(url)]
    pub base_url: String,
    /// Root for the cache and log directories.
    pub data_dir: PathBuf,
    #[validate(range(min = 1))]
    pub cache_ttl_secs: u64,
    pub enable_cache: bool,
    #[validate(range(min = 1))]
    pub rate_limit_per_hour: usize,
    #[validate(range(min = 1, max = 300))]
    pub api_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub page_limit: usize,
    pub log_level: String,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from("data"),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            enable_cache: true,
            rate_limit_per_hour: DEFAULT_RATE_LIMIT_PER_HOUR,
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            page_limit: DEFAULT_PAGE_LIMIT,
            log_level: "info".to_string(),
            debug: false,
        }
    }
}

impl Settings {
    /// Loads `.env` (if present) and then reads the environment.
    pub fn load() -> Result<Self, AppError> {
        match dotenv::dotenv() {
            Ok(path) => info!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_env()
    }

    /// Builds settings from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Settings::default();

        let api_key = env::var("DATA_GOV_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != API_KEY_PLACEHOLDER);

        let settings = Settings {
            api_key,
            base_url: env::var("DATA_GOV_BASE_URL").unwrap_or(defaults.base_url),
            data_dir: env::var("SAMARTH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            cache_ttl_secs: parse_var("CACHE_TTL", defaults.cache_ttl_secs)?,
            enable_cache: parse_flag("ENABLE_CACHE", defaults.enable_cache)?,
            rate_limit_per_hour: parse_var("API_RATE_LIMIT", defaults.rate_limit_per_hour)?,
            api_timeout_secs: parse_var("API_TIMEOUT", defaults.api_timeout_secs)?,
            page_limit: parse_var("API_PAGE_LIMIT", defaults.page_limit)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            debug: parse_flag("DEBUG", defaults.debug)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Demo mode means no live API credential is configured.
    pub fn is_demo_mode(&self) -> bool {
        self.api_key.is_none()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Full resource URL for an endpoint.
    pub fn api_url(&self, endpoint: Endpoint) -> Result<Url, AppError> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?.join(endpoint.resource_id())?)
    }

    /// Query-string parameters for a request, including authentication.
    pub fn api_params(&self, query: &ApiQuery) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(query.filters.len() + 4);
        if let Some(key) = &self.api_key {
            params.push(("api-key".to_string(), key.clone()));
        }
        params.push(("format".to_string(), "json".to_string()));
        params.push(("limit".to_string(), query.limit.to_string()));
        params.push(("offset".to_string(), query.offset.to_string()));
        for (key, value) in &query.filters {
            params.push((format!("filters[{}]", key), value.clone()));
        }
        params
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        _ => Ok(default),
    }
}

fn parse_flag(key: &str, default: bool) -> Result<bool, AppError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(AppError::Config(format!(
                "{} must be a boolean, got '{}'",
                key, other
            ))),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 10] = [
        "DATA_GOV_API_KEY",
        "DATA_GOV_BASE_URL",
        "SAMARTH_DATA_DIR",
        "CACHE_TTL",
        "ENABLE_CACHE",
        "API_RATE_LIMIT",
        "API_TIMEOUT",
        "API_PAGE_LIMIT",
        "LOG_LEVEL",
        "DEBUG",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        VARS.iter().map(|v| (*v, None)).collect()
    }

    #[test]
    fn test_defaults_without_environment() {
        temp_env::with_vars(cleared(), || {
            let settings = Settings::from_env().unwrap();
            assert!(settings.is_demo_mode());
            assert_eq!(settings.cache_ttl_secs, 3600);
            assert_eq!(settings.rate_limit_per_hour, 100);
            assert_eq!(settings.api_timeout_secs, 30);
            assert!(settings.enable_cache);
        });
    }

    #[test]
    fn test_placeholder_key_means_demo_mode() {
        let mut vars = cleared();
        vars.push(("DATA_GOV_API_KEY", Some("YOUR_API_KEY_HERE")));
        temp_env::with_vars(vars, || {
            assert!(Settings::from_env().unwrap().is_demo_mode());
        });
    }

    #[test]
    fn test_reads_overrides() {
        let mut vars = cleared();
        vars.push(("DATA_GOV_API_KEY", Some("abc123")));
        vars.push(("CACHE_TTL", Some("60")));
        vars.push(("ENABLE_CACHE", Some("false")));
        temp_env::with_vars(vars, || {
            let settings = Settings::from_env().unwrap();
            assert_eq!(settings.api_key.as_deref(), Some("abc123"));
            assert_eq!(settings.cache_ttl_secs, 60);
            assert!(!settings.enable_cache);
        });
    }

    #[test]
    fn test_malformed_number_is_config_error() {
        let mut vars = cleared();
        vars.push(("API_TIMEOUT", Some("soon")));
        temp_env::with_vars(vars, || {
            assert!(matches!(Settings::from_env(), Err(AppError::Config(_))));
        });
    }

    #[test]
    fn test_out_of_range_is_validation_error() {
        let mut vars = cleared();
        vars.push(("API_TIMEOUT", Some("0")));
        temp_env::with_vars(vars, || {
            assert!(matches!(Settings::from_env(), Err(AppError::Validation(_))));
        });
    }

    #[test]
    fn test_api_url_joins_resource_id() {
        let settings = Settings {
            base_url: "https://api.data.gov.in/resource".to_string(),
            ..Settings::default()
        };
        let url = settings.api_url(Endpoint::ImdRainfall).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070"
        );
    }

    #[test]
    fn test_api_params_include_filters() {
        let settings = Settings {
            api_key: Some("k".to_string()),
            ..Settings::default()
        };
        let query = ApiQuery::new(10).with_filter("state", "Punjab,Haryana");
        let params = settings.api_params(&query);
        assert!(params.contains(&("api-key".to_string(), "k".to_string())));
        assert!(params.contains(&("limit".to_string(), "10".to_string())));
        assert!(params.contains(&("filters[state]".to_string(), "Punjab,Haryana".to_string())));
    }

    #[test]
    fn test_endpoint_round_trips_through_key() {
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.key().parse::<Endpoint>().unwrap(), endpoint);
        }
        assert!(matches!(
            "weather".parse::<Endpoint>(),
            Err(AppError::UnknownEndpoint(_))
        ));
    }

    #[test]
    fn test_filter_list_splits_and_trims() {
        let query = ApiQuery::default().with_filter("state", "Punjab, Haryana,");
        assert_eq!(query.filter_list("state"), vec!["Punjab", "Haryana"]);
        assert!(query.filter_list("crop").is_empty());
    }
}
