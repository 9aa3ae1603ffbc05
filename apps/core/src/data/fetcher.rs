use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::config::{ApiQuery, Endpoint, Settings, APP_NAME, APP_VERSION};
use crate::data::cache::ResponseCache;
use crate::data::demo::DemoData;
use crate::data::source::DataSource;
use crate::error::AppError;
use crate::fs_manager::PathManager;
use crate::models::{
    ApiResponse, Dataset, DistrictRecord, FetchResult, FetchSource, ProductionRecord, RainfallRecord,
    SourceCitation,
};
use crate::rate_limiter::RateLimiter;

const CITATION_SOURCE: &str = "data.gov.in Open Government Data Platform";
const CITATION_PROVIDER: &str = "Government of India";

/// Connectivity of one endpoint, as seen through the fetch chain.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStatus {
    pub endpoint: Endpoint,
    pub reachable: bool,
    pub source: FetchSource,
}

/// Fetches data.gov.in resources with caching, rate limiting and demo fallback.
pub struct DataFetcher {
    settings: Settings,
    client: Client,
    cache: ResponseCache,
    limiter: Mutex<RateLimiter>,
}

impl DataFetcher {
    pub fn new(settings: Settings, paths: &PathManager) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(format!("{}/{}", APP_NAME, APP_VERSION))
            .default_headers(headers)
            .timeout(settings.api_timeout())
            .build()?;

        let cache = ResponseCache::new(paths.cache_dir(), settings.cache_ttl(), settings.enable_cache);
        let limiter = Mutex::new(RateLimiter::per_hour(settings.rate_limit_per_hour));

        Ok(Self {
            settings,
            client,
            cache,
            limiter,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Live requests still allowed in the current rate-limit window.
    pub fn remaining_requests(&self) -> usize {
        self.limiter.lock().map(|limiter| limiter.remaining()).unwrap_or(0)
    }

    /// Runs the fetch chain: fresh cache, demo mode, live API, stale cache, demo.
    ///
    /// Never fails; the returned `FetchSource` says which link answered.
    #[instrument(skip(self, query), fields(endpoint = %endpoint))]
    pub async fn fetch(&self, endpoint: Endpoint, query: &ApiQuery) -> FetchResult {
        let key = ResponseCache::key(endpoint, query);

        if let Some(response) = self.cache.get_fresh(&key) {
            info!("Using cached data for {}", endpoint);
            return FetchResult {
                response,
                source: FetchSource::Cache,
            };
        }

        if self.settings.is_demo_mode() {
            info!("Running in demo mode - using synthetic data");
            return FetchResult {
                response: DemoData::generate(endpoint, query),
                source: FetchSource::Demo,
            };
        }

        match self.fetch_live(endpoint, query).await {
            Ok(response) => {
                if let Err(e) = self.cache.put(&key, &response) {
                    error!("Error writing cache: {}", e);
                }
                FetchResult {
                    response,
                    source: FetchSource::Live,
                }
            }
            Err(e) => {
                error!("API request failed for {}: {}", endpoint, e);
                if let Some(response) = self.cache.get_stale(&key) {
                    warn!("Using expired cache due to API error");
                    return FetchResult {
                        response,
                        source: FetchSource::StaleCache,
                    };
                }
                warn!("Falling back to demo data");
                FetchResult {
                    response: DemoData::generate(endpoint, query),
                    source: FetchSource::Demo,
                }
            }
        }
    }

    async fn fetch_live(&self, endpoint: Endpoint, query: &ApiQuery) -> Result<ApiResponse, AppError> {
        self.acquire_slot()?;

        let url = self.settings.api_url(endpoint)?;
        let params = self.settings.api_params(query);

        info!("Fetching data from {}", endpoint);
        let body: Value = self
            .client
            .get(url.clone())
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The API reports some failures (bad key, unknown resource) with a 200.
        if body.get("status").and_then(Value::as_str) == Some("error") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified API error");
            return Err(AppError::Http(message.to_string()));
        }

        let parameters: BTreeMap<String, String> = params
            .into_iter()
            .filter(|(k, _)| k != "api-key")
            .collect();

        Ok(ApiResponse::new(endpoint, url.to_string(), parameters, body))
    }

    fn acquire_slot(&self) -> Result<(), AppError> {
        let mut limiter = self
            .limiter
            .lock()
            .map_err(|_| AppError::Internal("rate limiter lock poisoned".to_string()))?;
        limiter.try_acquire().map_err(|wait| {
            warn!("Rate limit reached, next slot in {:.0}s", wait.as_secs_f64());
            AppError::RateLimited(wait.as_secs())
        })
    }

    /// Probes every endpoint with a one-record request.
    pub async fn check_api_status(&self) -> Vec<EndpointStatus> {
        let mut statuses = Vec::with_capacity(Endpoint::ALL.len());
        for endpoint in Endpoint::ALL {
            let result = self.fetch(endpoint, &ApiQuery::new(1)).await;
            statuses.push(EndpointStatus {
                endpoint,
                reachable: result.source != FetchSource::Demo,
                source: result.source,
            });
        }
        statuses
    }

    /// Citation for data fetched from `endpoint` with the given parameters.
    pub fn source_citation(&self, endpoint: Endpoint, parameters: Value, demo: bool) -> SourceCitation {
        let url = if demo {
            format!("demo://{}", endpoint.key())
        } else {
            self.settings
                .api_url(endpoint)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| self.settings.base_url.clone())
        };

        SourceCitation {
            name: endpoint.display_name().to_string(),
            endpoint,
            url,
            parameters,
            timestamp: Utc::now(),
            source: CITATION_SOURCE.to_string(),
            provider: CITATION_PROVIDER.to_string(),
            demo,
        }
    }

    pub fn clear_cache(&self, endpoint: Option<Endpoint>) -> Result<usize, AppError> {
        self.cache.clear(endpoint)
    }

    async fn dataset<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: ApiQuery,
        citation_params: Value,
    ) -> Dataset<T> {
        let result = self.fetch(endpoint, &query).await;
        let records: Vec<T> = result.response.parse_records();
        info!(
            records = records.len(),
            source = %result.source,
            "Fetched {}", endpoint
        );
        let citation = self.source_citation(endpoint, citation_params, result.source == FetchSource::Demo);
        Dataset {
            records,
            citation,
            source: result.source,
        }
    }
}

fn join_years(years: &[i32]) -> String {
    years.iter().map(i32::to_string).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl DataSource for DataFetcher {
    async fn rainfall(&self, states: &[String], years: &[i32]) -> Result<Dataset<RainfallRecord>, AppError> {
        let query = ApiQuery::new(self.settings.page_limit)
            .with_filter("state", states.join(","))
            .with_filter("year", join_years(years));
        let params = json!({ "states": states, "years": years });
        Ok(self.dataset(Endpoint::ImdRainfall, query, params).await)
    }

    async fn crop_production(
        &self,
        states: &[String],
        crops: &[String],
        years: &[i32],
    ) -> Result<Dataset<ProductionRecord>, AppError> {
        let query = ApiQuery::new(self.settings.page_limit)
            .with_filter("state", states.join(","))
            .with_filter("crop", crops.join(","))
            .with_filter("year", join_years(years));
        let params = json!({ "states": states, "crops": crops, "years": years });
        Ok(self.dataset(Endpoint::AgricultureProduction, query, params).await)
    }

    async fn district_production(&self, state: &str, crop: Option<&str>) -> Result<Dataset<DistrictRecord>, AppError> {
        let query = ApiQuery::new(self.settings.page_limit)
            .with_filter("state", state)
            .with_filter("crop", crop.unwrap_or_default());
        let params = json!({ "state": state, "crop": crop });
        Ok(self.dataset(Endpoint::DistrictWiseCrops, query, params).await)
    }
}
