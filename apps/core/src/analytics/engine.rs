use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::stats;
use super::types::*;
use crate::models::{DistrictRecord, ProductionRecord, RainfallRecord, Tabular};
use crate::query::{Intent, Metric, ParsedQuery};

const TOP_CROPS_PER_STATE: usize = 5;
const PRODUCTION_TREND_THRESHOLD: f64 = 2.0;
const RAINFALL_TREND_THRESHOLD: f64 = 1.0;
/// Joined rows must exceed this before a correlation is reported.
const MIN_CORRELATION_ROWS: usize = 5;
const SIGNIFICANCE_LEVEL: f64 = 0.05;
const OUTLIER_Z: f64 = 3.0;
const SAMPLE_ROWS: usize = 5;
const TOTALS_LIMIT: usize = 10;

/// Confidence in an answer given how many records back it.
pub fn confidence_for(data_points: usize) -> f64 {
    match data_points {
        0 => 0.0,
        n if n < 10 => 0.5,
        n if n < 50 => 0.7,
        n if n < 100 => 0.85,
        _ => 0.95,
    }
}

/// Human description of a correlation coefficient.
pub fn interpret_correlation(r: f64) -> String {
    let strength = match r.abs() {
        a if a > 0.7 => "strong",
        a if a > 0.4 => "moderate",
        a if a > 0.2 => "weak",
        _ => "very weak",
    };
    let direction = if r > 0.0 { "positive" } else { "negative" };
    format!("{} {} correlation", strength, direction)
}

/// Stateless analysis over fetched datasets.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Runs the analysis for the query's intent and attaches district highlights.
    pub fn analyze(&self, parsed: &ParsedQuery, data: &QueryData) -> AnalysisReport {
        let mut report = match parsed.intent {
            Intent::Compare => self.compare(data),
            Intent::Top => self.top_n(parsed.top_n, data),
            Intent::Trend => self.trend(data),
            Intent::Correlation => self.correlation(data),
            Intent::General => self.general(data),
        };
        report.districts = self.district_highlights(data);

        info!(
            intent = %parsed.intent,
            data_points = report.data_points,
            confidence = report.confidence,
            "Analysis complete"
        );
        report
    }

    pub fn compare(&self, data: &QueryData) -> AnalysisReport {
        let rainfall_records = data.rainfall_records();
        let production_records = data.production_records();

        let rainfall = group_mean(rainfall_records.iter().map(|r| (r.state.as_str(), r.annual_rainfall_mm)))
            .into_iter()
            .map(|(name, value)| NamedValue { name, value })
            .collect();

        let mut per_state: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
        for record in production_records {
            *per_state
                .entry(record.state.as_str())
                .or_default()
                .entry(record.crop.as_str())
                .or_default() += record.production_tonnes;
        }
        let crops = per_state
            .into_iter()
            .map(|(state, totals)| {
                let ranked = rank_desc(totals.into_iter().map(|(c, v)| (c.to_string(), v)).collect());
                StateCrops {
                    state: state.to_string(),
                    crops: ranked
                        .into_iter()
                        .take(TOP_CROPS_PER_STATE)
                        .map(|(crop, production)| CropTotal { crop, production })
                        .collect(),
                }
            })
            .collect();

        let data_points = rainfall_records.len() + production_records.len();
        report(AnalysisDetail::Compare(CompareSummary { rainfall, crops }), data_points)
    }

    /// Crops by total production; states by mean rainfall when there is no
    /// production data.
    pub fn top_n(&self, n: usize, data: &QueryData) -> AnalysisReport {
        let production = data.production_records();
        let rainfall = data.rainfall_records();

        let (metric, ranked, data_points) = if !production.is_empty() {
            let totals = group_sum(production.iter().map(|r| (r.crop.as_str(), r.production_tonnes)));
            (Some(Metric::Production), rank_desc(totals.into_iter().collect()), production.len())
        } else if !rainfall.is_empty() {
            let means = group_mean(rainfall.iter().map(|r| (r.state.as_str(), r.annual_rainfall_mm)));
            (Some(Metric::Rainfall), rank_desc(means.into_iter().collect()), rainfall.len())
        } else {
            (None, Vec::new(), 0)
        };

        let unit = metric.map(|m| m.unit()).unwrap_or_default();
        let items = ranked
            .into_iter()
            .take(n)
            .map(|(name, value)| RankedItem {
                name,
                value,
                unit: unit.to_string(),
            })
            .collect();

        report(AnalysisDetail::Top(TopSummary { metric, items }), data_points)
    }

    /// Yearly production totals, or yearly mean rainfall when production
    /// does not span two years.
    pub fn trend(&self, data: &QueryData) -> AnalysisReport {
        let production = data.production_records();
        let rainfall = data.rainfall_records();

        let summary = production_trend(production)
            .map(|s| (s, production.len()))
            .or_else(|| rainfall_trend(rainfall).map(|s| (s, rainfall.len())));

        match summary {
            Some((summary, data_points)) => {
                debug!(
                    metric = %summary.metric,
                    growth_rate = summary.growth_rate,
                    "Trend computed"
                );
                report(AnalysisDetail::Trend(Some(summary)), data_points)
            }
            None => report(AnalysisDetail::Trend(None), 0),
        }
    }

    /// Pearson correlation of rainfall and production over matching
    /// (state, year) rows.
    pub fn correlation(&self, data: &QueryData) -> AnalysisReport {
        let points = join_on_state_year(data.rainfall_records(), data.production_records());
        if points.len() <= MIN_CORRELATION_ROWS {
            debug!(rows = points.len(), "Not enough overlapping rows for correlation");
            return report(AnalysisDetail::Correlation(None), 0);
        }

        let xs: Vec<f64> = points.iter().map(|p| p.rainfall).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.production).collect();
        let Some(coefficient) = stats::pearson(&xs, &ys) else {
            debug!("Zero variance in joined rows; correlation undefined");
            return report(AnalysisDetail::Correlation(None), 0);
        };

        let sample_size = points.len();
        let p_value = stats::pearson_p_value(coefficient, sample_size);
        let summary = CorrelationSummary {
            coefficient,
            p_value,
            significant: p_value < SIGNIFICANCE_LEVEL,
            interpretation: interpret_correlation(coefficient),
            sample_size,
            points,
        };
        report(AnalysisDetail::Correlation(Some(summary)), sample_size)
    }

    pub fn general(&self, data: &QueryData) -> AnalysisReport {
        let mut datasets = Vec::new();
        if let Some(summary) = summarize("rainfall", data.rainfall_records()) {
            datasets.push(summary);
        }
        if let Some(summary) = summarize("production", data.production_records()) {
            datasets.push(summary);
        }
        for dataset in &data.districts {
            let name = match dataset.records.first() {
                Some(record) => format!("district_{}", record.state),
                None => continue,
            };
            if let Some(summary) = summarize(&name, &dataset.records) {
                datasets.push(summary);
            }
        }

        let data_points = datasets.iter().map(|d| d.record_count).sum();
        report(AnalysisDetail::General(GeneralSummary { datasets }), data_points)
    }

    pub fn district_highlights(&self, data: &QueryData) -> Vec<DistrictHighlight> {
        data.districts
            .iter()
            .filter_map(|d| district_highlight(&d.records))
            .collect()
    }
}

fn report(detail: AnalysisDetail, data_points: usize) -> AnalysisReport {
    AnalysisReport {
        detail,
        districts: Vec::new(),
        data_points,
        confidence: confidence_for(data_points),
    }
}

fn group_sum<'a>(rows: impl Iterator<Item = (&'a str, f64)>) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (key, value) in rows {
        *totals.entry(key.to_string()).or_default() += value;
    }
    totals
}

fn group_mean<'a>(rows: impl Iterator<Item = (&'a str, f64)>) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (key, value) in rows {
        groups.entry(key.to_string()).or_default().push(value);
    }
    groups
        .into_iter()
        .filter_map(|(k, v)| stats::mean(&v).map(|m| (k, m)))
        .collect()
}

/// Largest first; equal values by name.
fn rank_desc(mut items: Vec<(String, f64)>) -> Vec<(String, f64)> {
    items.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items
}

fn yearly(rows: impl Iterator<Item = (i32, f64)>, mean: bool) -> Vec<YearValue> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for (year, value) in rows {
        by_year.entry(year).or_default().push(value);
    }
    by_year
        .into_iter()
        .map(|(year, values)| {
            let value = if mean {
                stats::mean(&values).unwrap_or_default()
            } else {
                values.iter().sum()
            };
            YearValue { year, value }
        })
        .collect()
}

fn build_trend(metric: Metric, series: Vec<YearValue>, threshold: f64, by_state: Vec<StateSeries>) -> Option<TrendSummary> {
    if series.len() < 2 {
        return None;
    }
    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let growth_rate = stats::mean(&stats::growth_rates(&values)).unwrap_or(0.0);

    let years: Vec<f64> = series.iter().map(|p| f64::from(p.year)).collect();
    let trend_line = stats::linear_fit(&years, &values)
        .map(|(slope, intercept)| {
            series
                .iter()
                .map(|p| YearValue {
                    year: p.year,
                    value: slope * f64::from(p.year) + intercept,
                })
                .collect()
        })
        .unwrap_or_default();

    let first = series[0];
    let last = series[series.len() - 1];
    Some(TrendSummary {
        metric,
        direction: TrendDirection::from_growth(growth_rate, threshold),
        growth_rate,
        start_year: first.year,
        end_year: last.year,
        start_value: first.value,
        end_value: last.value,
        series,
        trend_line,
        by_state: if by_state.len() > 1 { by_state } else { Vec::new() },
    })
}

fn production_trend(records: &[ProductionRecord]) -> Option<TrendSummary> {
    let series = yearly(records.iter().map(|r| (r.year, r.production_tonnes)), false);
    let mut states: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();
    for r in records {
        states.entry(r.state.as_str()).or_default().push((r.year, r.production_tonnes));
    }
    let by_state = states
        .into_iter()
        .map(|(state, rows)| StateSeries {
            state: state.to_string(),
            points: yearly(rows.into_iter(), false),
        })
        .collect();
    build_trend(Metric::Production, series, PRODUCTION_TREND_THRESHOLD, by_state)
}

fn rainfall_trend(records: &[RainfallRecord]) -> Option<TrendSummary> {
    let series = yearly(records.iter().map(|r| (r.year, r.annual_rainfall_mm)), true);
    let mut states: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();
    for r in records {
        states.entry(r.state.as_str()).or_default().push((r.year, r.annual_rainfall_mm));
    }
    let by_state = states
        .into_iter()
        .map(|(state, rows)| StateSeries {
            state: state.to_string(),
            points: yearly(rows.into_iter(), true),
        })
        .collect();
    build_trend(Metric::Rainfall, series, RAINFALL_TREND_THRESHOLD, by_state)
}

/// Inner join: every rainfall row paired with every production row of the
/// same state and year.
fn join_on_state_year(rainfall: &[RainfallRecord], production: &[ProductionRecord]) -> Vec<CorrelationPoint> {
    let mut index: BTreeMap<(&str, i32), Vec<f64>> = BTreeMap::new();
    for p in production {
        index.entry((p.state.as_str(), p.year)).or_default().push(p.production_tonnes);
    }

    let mut points = Vec::new();
    for r in rainfall {
        if let Some(productions) = index.get(&(r.state.as_str(), r.year)) {
            for &production in productions {
                points.push(CorrelationPoint {
                    state: r.state.clone(),
                    year: r.year,
                    rainfall: r.annual_rainfall_mm,
                    production,
                });
            }
        }
    }
    points
}

fn summarize<T: Tabular>(name: &str, records: &[T]) -> Option<DatasetSummary> {
    let first = records.first()?;

    let stats = first
        .numeric_values()
        .into_iter()
        .enumerate()
        .filter_map(|(i, (column, _))| {
            let values: Vec<f64> = records.iter().filter_map(|r| r.numeric_values()[i].1).collect();
            column_stats(column, &values)
        })
        .collect();

    let totals = group_sum(records.iter().map(|r| (r.category(), r.primary_value())));
    let totals = rank_desc(totals.into_iter().collect())
        .into_iter()
        .take(TOTALS_LIMIT)
        .map(|(name, value)| NamedValue { name, value })
        .collect();

    Some(DatasetSummary {
        name: name.to_string(),
        record_count: records.len(),
        columns: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
        sample: records
            .iter()
            .take(SAMPLE_ROWS)
            .filter_map(|r| serde_json::to_value(r).ok())
            .collect(),
        stats,
        primary_metric: T::PRIMARY_METRIC.to_string(),
        totals,
    })
}

fn column_stats(column: &str, values: &[f64]) -> Option<ColumnStats> {
    Some(ColumnStats {
        column: column.to_string(),
        mean: stats::mean(values)?,
        median: stats::median(values)?,
        min: stats::min(values)?,
        max: stats::max(values)?,
        std: stats::sample_std(values),
        outliers: stats::z_outliers(values, OUTLIER_Z),
    })
}

fn district_highlight(records: &[DistrictRecord]) -> Option<DistrictHighlight> {
    let highest = records.iter().max_by(|a, b| a.production_tonnes.total_cmp(&b.production_tonnes))?;
    let lowest = records.iter().min_by(|a, b| a.production_tonnes.total_cmp(&b.production_tonnes))?;
    let productions: Vec<f64> = records.iter().map(|r| r.production_tonnes).collect();
    let districts: BTreeSet<&str> = records.iter().map(|r| r.district.as_str()).collect();

    Some(DistrictHighlight {
        state: highest.state.clone(),
        highest: entry(highest),
        lowest: entry(lowest),
        average_production: stats::mean(&productions)?,
        district_count: districts.len(),
        cells: records.iter().map(entry).collect(),
    })
}

fn entry(record: &DistrictRecord) -> DistrictEntry {
    DistrictEntry {
        district: record.district.clone(),
        crop: record.crop.clone(),
        production: record.production_tonnes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production(state: &str, crop: &str, year: i32, tonnes: f64) -> ProductionRecord {
        ProductionRecord {
            state: state.to_string(),
            crop: crop.to_string(),
            year,
            production_tonnes: tonnes,
            area_hectares: None,
            yield_kg_per_hectare: None,
        }
    }

    fn rainfall(state: &str, year: i32, mm: f64) -> RainfallRecord {
        RainfallRecord {
            state: state.to_string(),
            district: None,
            year,
            annual_rainfall_mm: mm,
            monsoon_rainfall_mm: None,
        }
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(confidence_for(0), 0.0);
        assert_eq!(confidence_for(9), 0.5);
        assert_eq!(confidence_for(10), 0.7);
        assert_eq!(confidence_for(49), 0.7);
        assert_eq!(confidence_for(99), 0.85);
        assert_eq!(confidence_for(100), 0.95);
    }

    #[test]
    fn test_interpretation() {
        assert_eq!(interpret_correlation(0.85), "strong positive correlation");
        assert_eq!(interpret_correlation(-0.5), "moderate negative correlation");
        assert_eq!(interpret_correlation(0.3), "weak positive correlation");
        assert_eq!(interpret_correlation(-0.1), "very weak negative correlation");
    }

    #[test]
    fn test_rank_breaks_ties_by_name() {
        let ranked = rank_desc(vec![
            ("Wheat".to_string(), 10.0),
            ("Barley".to_string(), 10.0),
            ("Rice".to_string(), 20.0),
        ]);
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Rice", "Barley", "Wheat"]);
    }

    #[test]
    fn test_join_produces_every_matching_pair() {
        let rain = vec![rainfall("Punjab", 2020, 600.0), rainfall("Punjab", 2021, 650.0)];
        let prod = vec![
            production("Punjab", "Rice", 2020, 10.0),
            production("Punjab", "Wheat", 2020, 20.0),
            production("Haryana", "Rice", 2020, 30.0),
        ];

        let points = join_on_state_year(&rain, &prod);
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.year == 2020 && p.rainfall == 600.0));
    }

    #[test]
    fn test_summarize_counts_missing_values_out() {
        let records = vec![
            production("Punjab", "Rice", 2020, 10.0),
            ProductionRecord {
                area_hectares: Some(4.0),
                ..production("Punjab", "Wheat", 2020, 30.0)
            },
        ];

        let summary = summarize("production", &records).unwrap();
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.stat("production_tonnes").unwrap().mean, 20.0);
        assert_eq!(summary.stat("area_hectares").unwrap().mean, 4.0);
        assert!(summary.stat("yield_kg_per_hectare").is_none());
        assert_eq!(summary.totals[0].name, "Punjab");
        assert_eq!(summary.totals[0].value, 40.0);
    }
}
