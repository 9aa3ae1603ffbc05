use serde::Serialize;
use serde_json::Value;

use crate::models::{Dataset, DistrictRecord, ProductionRecord, RainfallRecord, SourceCitation};
use crate::query::Metric;

/// Everything fetched for one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall: Option<Dataset<RainfallRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production: Option<Dataset<ProductionRecord>>,
    /// One dataset per state, in query order.
    pub districts: Vec<Dataset<DistrictRecord>>,
}

impl QueryData {
    pub fn rainfall_records(&self) -> &[RainfallRecord] {
        self.rainfall.as_ref().map(|d| d.records.as_slice()).unwrap_or(&[])
    }

    pub fn production_records(&self) -> &[ProductionRecord] {
        self.production.as_ref().map(|d| d.records.as_slice()).unwrap_or(&[])
    }

    pub fn sources(&self) -> Vec<SourceCitation> {
        let rainfall = self.rainfall.iter().map(|d| d.citation.clone());
        let production = self.production.iter().map(|d| d.citation.clone());
        let districts = self.districts.iter().map(|d| d.citation.clone());
        rainfall.chain(production).chain(districts).collect()
    }

    /// Record count per fetched dataset, labelled by source name.
    pub fn record_counts(&self) -> Vec<(String, usize)> {
        let rainfall = self.rainfall.iter().map(|d| (d.citation.name.clone(), d.len()));
        let production = self.production.iter().map(|d| (d.citation.name.clone(), d.len()));
        let districts = self.districts.iter().map(|d| {
            let state = d.citation.parameters.get("state").and_then(Value::as_str);
            let name = match state {
                Some(state) => format!("{} ({})", d.citation.name, state),
                None => d.citation.name.clone(),
            };
            (name, d.len())
        });
        rainfall.chain(production).chain(districts).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rainfall_records().is_empty()
            && self.production_records().is_empty()
            && self.districts.iter().all(|d| d.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropTotal {
    pub crop: String,
    pub production: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCrops {
    pub state: String,
    pub crops: Vec<CropTotal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompareSummary {
    /// Mean annual rainfall per state, by state name.
    pub rainfall: Vec<NamedValue>,
    /// Leading crops per state, by state name.
    pub crops: Vec<StateCrops>,
}

impl CompareSummary {
    pub fn is_empty(&self) -> bool {
        self.rainfall.is_empty() && self.crops.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopSummary {
    /// Metric the ranking is based on; `None` when there was nothing to rank.
    pub metric: Option<Metric>,
    pub items: Vec<RankedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    /// Classifies an average growth rate against a symmetric threshold (in %).
    pub fn from_growth(growth_rate: f64, threshold: f64) -> Self {
        if growth_rate > threshold {
            TrendDirection::Increasing
        } else if growth_rate < -threshold {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSeries {
    pub state: String,
    pub points: Vec<YearValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub metric: Metric,
    pub direction: TrendDirection,
    /// Mean year-over-year change, in percent.
    pub growth_rate: f64,
    pub start_year: i32,
    pub end_year: i32,
    pub start_value: f64,
    pub end_value: f64,
    pub series: Vec<YearValue>,
    /// Least-squares fit evaluated at each year of `series`.
    pub trend_line: Vec<YearValue>,
    /// Per-state series; empty unless more than one state is present.
    pub by_state: Vec<StateSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPoint {
    pub state: String,
    pub year: i32,
    pub rainfall: f64,
    pub production: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub coefficient: f64,
    pub p_value: f64,
    pub significant: bool,
    pub interpretation: String,
    pub sample_size: usize,
    pub points: Vec<CorrelationPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    /// Values more than three standard deviations from the mean.
    pub outliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// `rainfall`, `production` or `district_<state>`.
    pub name: String,
    pub record_count: usize,
    pub columns: Vec<String>,
    pub sample: Vec<Value>,
    pub stats: Vec<ColumnStats>,
    pub primary_metric: String,
    /// Primary metric summed per category, largest first, at most ten.
    pub totals: Vec<NamedValue>,
}

impl DatasetSummary {
    pub fn stat(&self, column: &str) -> Option<&ColumnStats> {
        self.stats.iter().find(|s| s.column == column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneralSummary {
    pub datasets: Vec<DatasetSummary>,
}

impl GeneralSummary {
    pub fn dataset(&self, name: &str) -> Option<&DatasetSummary> {
        self.datasets.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictEntry {
    pub district: String,
    pub crop: String,
    pub production: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictHighlight {
    pub state: String,
    pub highest: DistrictEntry,
    pub lowest: DistrictEntry,
    pub average_production: f64,
    pub district_count: usize,
    /// Every district and crop row, for the heatmap.
    pub cells: Vec<DistrictEntry>,
}

/// Intent-specific result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "summary", rename_all = "snake_case")]
pub enum AnalysisDetail {
    Compare(CompareSummary),
    Top(TopSummary),
    Trend(Option<TrendSummary>),
    Correlation(Option<CorrelationSummary>),
    General(GeneralSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub detail: AnalysisDetail,
    pub districts: Vec<DistrictHighlight>,
    pub data_points: usize,
    pub confidence: f64,
}
