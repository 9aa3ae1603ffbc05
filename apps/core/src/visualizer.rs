//! Chart specifications for query results.
//!
//! Charts are plain data: they serialise to JSON for external plotting and
//! render as text for the terminal. Nothing here draws pixels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::analytics::{
    stats, AnalysisDetail, AnalysisReport, CompareSummary, CorrelationSummary, DatasetSummary, DistrictHighlight,
    GeneralSummary, TopSummary, TrendSummary,
};
use crate::query::answer::with_thousands;
use crate::query::ParsedQuery;

/// ColorBrewer Set2.
pub const PALETTE: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

const BAR_WIDTH: usize = 30;
const MIN_MARKER: f64 = 6.0;
const MARKER_RANGE: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    GroupedBar,
    HorizontalBar,
    Pie,
    Line,
    Scatter,
    Heatmap,
}

/// Category label or numeric coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Category(String),
}

impl std::fmt::Display for AxisValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisValue::Number(n) if n.fract() == 0.0 => write!(f, "{}", n),
            AxisValue::Number(n) => write!(f, "{:.1}", n),
            AxisValue::Category(c) => f.write_str(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: AxisValue,
    pub y: f64,
    /// Marker size for scatter charts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl DataPoint {
    fn category(label: impl Into<String>, y: f64) -> Self {
        Self {
            x: AxisValue::Category(label.into()),
            y,
            size: None,
        }
    }

    fn number(x: f64, y: f64) -> Self {
        Self {
            x: AxisValue::Number(x),
            y,
            size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub dashed: bool,
    pub points: Vec<DataPoint>,
}

impl Series {
    fn new(name: impl Into<String>, index: usize, points: Vec<DataPoint>) -> Self {
        Self {
            name: name.into(),
            color: PALETTE[index % PALETTE.len()].to_string(),
            dashed: false,
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    #[serde(default)]
    pub annotations: Vec<String>,
    /// Draw the first category at the top (ranked horizontal bars).
    #[serde(default)]
    pub reversed_y: bool,
}

impl Chart {
    fn new(kind: ChartKind, title: impl Into<String>, x_label: &str, y_label: &str) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
            annotations: Vec::new(),
            reversed_y: false,
        }
    }

    fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }
}

/// Picks and builds charts for an analysis.
#[derive(Debug, Clone, Default)]
pub struct Visualizer;

impl Visualizer {
    pub fn new() -> Self {
        Self
    }

    pub fn charts_for(&self, parsed: &ParsedQuery, report: &AnalysisReport) -> Vec<Chart> {
        let mut charts = match &report.detail {
            AnalysisDetail::Compare(summary) => compare_charts(summary),
            AnalysisDetail::Top(summary) => top_charts(parsed.top_n, summary),
            AnalysisDetail::Trend(Some(summary)) => trend_charts(summary),
            AnalysisDetail::Correlation(Some(summary)) => vec![correlation_chart(summary)],
            AnalysisDetail::General(summary) => general_charts(summary),
            AnalysisDetail::Trend(None) | AnalysisDetail::Correlation(None) => Vec::new(),
        };
        charts.extend(report.districts.iter().map(district_heatmap));
        charts
    }
}

fn compare_charts(summary: &CompareSummary) -> Vec<Chart> {
    let mut charts = Vec::new();

    if !summary.rainfall.is_empty() {
        let points = summary
            .rainfall
            .iter()
            .map(|s| DataPoint::category(&s.name, s.value))
            .collect();
        charts.push(
            Chart::new(ChartKind::Bar, "Average Annual Rainfall by State", "State", "Rainfall (mm)")
                .with_series(Series::new("Average rainfall", 0, points)),
        );
    }

    if !summary.crops.is_empty() {
        // One series per crop, in order of first appearance.
        let mut by_crop: Vec<(String, Vec<DataPoint>)> = Vec::new();
        for state in &summary.crops {
            for crop in &state.crops {
                let point = DataPoint::category(&state.state, crop.production);
                match by_crop.iter_mut().find(|(name, _)| *name == crop.crop) {
                    Some((_, points)) => points.push(point),
                    None => by_crop.push((crop.crop.clone(), vec![point])),
                }
            }
        }

        let mut chart = Chart::new(
            ChartKind::GroupedBar,
            "Top Crops Production by State",
            "State",
            "Production (tonnes)",
        );
        chart.series = by_crop
            .into_iter()
            .enumerate()
            .map(|(i, (crop, points))| Series::new(crop, i, points))
            .collect();
        charts.push(chart);
    }

    charts
}

fn top_charts(n: usize, summary: &TopSummary) -> Vec<Chart> {
    let Some(metric) = summary.metric else {
        return Vec::new();
    };
    if summary.items.is_empty() {
        return Vec::new();
    }

    let subject = match metric {
        crate::query::Metric::Production => "Crops by Production",
        crate::query::Metric::Rainfall => "States by Rainfall",
    };
    let value_label = format!("{} ({})", capitalized(&metric.to_string()), metric.unit());
    let points: Vec<DataPoint> = summary
        .items
        .iter()
        .map(|item| DataPoint::category(&item.name, item.value))
        .collect();

    let mut ranking = Chart::new(
        ChartKind::HorizontalBar,
        format!("Top {} {}", n, subject),
        &value_label,
        "",
    )
    .with_series(Series::new(metric.to_string(), 0, points.clone()));
    ranking.reversed_y = true;

    let mut share = Chart::new(ChartKind::Pie, format!("Distribution of Top {}", n), "", "")
        .with_series(Series::new(metric.to_string(), 0, points));
    share.annotations.push("donut".to_string());

    vec![ranking, share]
}

fn trend_charts(summary: &TrendSummary) -> Vec<Chart> {
    let metric = capitalized(&summary.metric.to_string());
    let y_label = format!("{} ({})", metric, summary.metric.unit());

    let actual = summary
        .series
        .iter()
        .map(|p| DataPoint::number(f64::from(p.year), p.value))
        .collect();
    let fitted = summary
        .trend_line
        .iter()
        .map(|p| DataPoint::number(f64::from(p.year), p.value))
        .collect();

    let mut chart = Chart::new(
        ChartKind::Line,
        format!("{} Trend ({}-{})", metric, summary.start_year, summary.end_year),
        "Year",
        &y_label,
    )
    .with_series(Series::new(format!("Actual {}", summary.metric), 0, actual));
    if !summary.trend_line.is_empty() {
        let mut line = Series::new("Trend", 1, fitted);
        line.dashed = true;
        chart.series.push(line);
    }
    chart.annotations.push(format!(
        "Average growth: {:.2}% per year ({})",
        summary.growth_rate,
        summary.direction.label()
    ));

    let mut charts = vec![chart];

    if summary.by_state.len() > 1 {
        let mut by_state = Chart::new(
            ChartKind::Line,
            format!("{} by State over Time", metric),
            "Year",
            &y_label,
        );
        by_state.series = summary
            .by_state
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let points = s
                    .points
                    .iter()
                    .map(|p| DataPoint::number(f64::from(p.year), p.value))
                    .collect();
                Series::new(&s.state, i, points)
            })
            .collect();
        charts.push(by_state);
    }

    charts
}

fn correlation_chart(summary: &CorrelationSummary) -> Chart {
    let productions: Vec<f64> = summary.points.iter().map(|p| p.production).collect();
    let sizes = stats::min_max_normalize(&productions);

    let mut by_state: BTreeMap<&str, Vec<DataPoint>> = BTreeMap::new();
    for (point, size) in summary.points.iter().zip(sizes) {
        by_state.entry(point.state.as_str()).or_default().push(DataPoint {
            x: AxisValue::Number(point.rainfall),
            y: point.production,
            size: Some(MIN_MARKER + size * MARKER_RANGE),
        });
    }

    let mut chart = Chart::new(
        ChartKind::Scatter,
        format!("Rainfall vs Production (r = {:.3})", summary.coefficient),
        "Annual Rainfall (mm)",
        "Production (tonnes)",
    );
    chart.series = by_state
        .into_iter()
        .enumerate()
        .map(|(i, (state, points))| Series::new(state, i, points))
        .collect();
    chart
        .annotations
        .push(format!("{} (p = {:.4})", summary.interpretation, summary.p_value));
    chart
}

fn general_charts(summary: &GeneralSummary) -> Vec<Chart> {
    summary
        .datasets
        .iter()
        .filter(|d| !d.totals.is_empty() && !d.name.starts_with("district_"))
        .map(dataset_chart)
        .collect()
}

fn dataset_chart(dataset: &DatasetSummary) -> Chart {
    let label = dataset.primary_metric.replace('_', " ");
    let points = dataset
        .totals
        .iter()
        .map(|t| DataPoint::category(&t.name, t.value))
        .collect();
    Chart::new(
        ChartKind::Bar,
        format!("Total {} by State (top {})", label, dataset.totals.len()),
        "State",
        &label,
    )
    .with_series(Series::new(&dataset.name, 0, points))
}

fn district_heatmap(highlight: &DistrictHighlight) -> Chart {
    let mut by_crop: BTreeMap<&str, Vec<DataPoint>> = BTreeMap::new();
    for cell in &highlight.cells {
        by_crop
            .entry(cell.crop.as_str())
            .or_default()
            .push(DataPoint::category(&cell.district, cell.production));
    }

    let mut chart = Chart::new(
        ChartKind::Heatmap,
        format!("District-wise Crop Production: {}", highlight.state),
        "District",
        "Crop",
    );
    chart.series = by_crop
        .into_iter()
        .enumerate()
        .map(|(i, (crop, points))| Series::new(crop, i, points))
        .collect();
    chart
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Plain-text rendering for terminals.
pub fn render_text(chart: &Chart) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", chart.title);

    match chart.kind {
        ChartKind::Bar | ChartKind::GroupedBar | ChartKind::HorizontalBar | ChartKind::Heatmap => {
            let peak = chart
                .series
                .iter()
                .flat_map(|s| s.points.iter().map(|p| p.y))
                .fold(0.0_f64, f64::max);
            for series in &chart.series {
                if chart.series.len() > 1 {
                    let _ = writeln!(out, "[{}]", series.name);
                }
                for point in &series.points {
                    let _ = writeln!(
                        out,
                        "  {:<24} {:<width$} {}",
                        point.x.to_string(),
                        bar(point.y, peak),
                        with_thousands(point.y, 1),
                        width = BAR_WIDTH
                    );
                }
            }
        }
        ChartKind::Pie => {
            for series in &chart.series {
                let total: f64 = series.points.iter().map(|p| p.y).sum();
                for point in &series.points {
                    let share = if total > 0.0 { point.y / total * 100.0 } else { 0.0 };
                    let _ = writeln!(out, "  {:<24} {:>5.1}%", point.x.to_string(), share);
                }
            }
        }
        ChartKind::Line | ChartKind::Scatter => {
            let _ = writeln!(out, "  x: {} / y: {}", chart.x_label, chart.y_label);
            for series in &chart.series {
                let style = if series.dashed { " (dashed)" } else { "" };
                let _ = writeln!(out, "[{}{}]", series.name, style);
                for point in &series.points {
                    let _ = writeln!(out, "  {:>10}  {}", point.x.to_string(), with_thousands(point.y, 1));
                }
            }
        }
    }

    for note in &chart.annotations {
        let _ = writeln!(out, "  * {}", note);
    }
    out
}

fn bar(value: f64, peak: f64) -> String {
    if peak <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / peak) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.clamp(1, BAR_WIDTH))
}
