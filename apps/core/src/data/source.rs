use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Dataset, DistrictRecord, ProductionRecord, RainfallRecord};

/// Defines the typed data access used by the query engine.
///
/// This trait abstracts the specific provider so the engine can run against
/// the live fetcher or an in-memory fixture.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Annual rainfall for the given states and years.
    async fn rainfall(&self, states: &[String], years: &[i32]) -> Result<Dataset<RainfallRecord>, AppError>;

    /// Crop production for the given states; empty `crops` or `years` means no filter.
    async fn crop_production(
        &self,
        states: &[String],
        crops: &[String],
        years: &[i32],
    ) -> Result<Dataset<ProductionRecord>, AppError>;

    /// District-wise production within one state, optionally for one crop.
    async fn district_production(&self, state: &str, crop: Option<&str>) -> Result<Dataset<DistrictRecord>, AppError>;
}
