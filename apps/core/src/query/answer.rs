//! Natural-language answers, one template per intent.

use num_format::{Locale, ToFormattedString};
use std::fmt::Write;

use crate::analytics::{
    AnalysisDetail, AnalysisReport, CompareSummary, CorrelationSummary, DistrictHighlight, GeneralSummary,
    TopSummary, TrendSummary,
};

use super::parsed::ParsedQuery;

const SAMPLE_LINES: usize = 3;
const CROPS_PER_STATE_LINES: usize = 3;

/// Builds the answer text for an analysed query.
pub fn compose(parsed: &ParsedQuery, report: &AnalysisReport) -> String {
    let mut answer = match &report.detail {
        AnalysisDetail::Compare(summary) => compare(summary),
        AnalysisDetail::Top(summary) => top(parsed.top_n, summary),
        AnalysisDetail::Trend(summary) => trend(summary.as_ref()),
        AnalysisDetail::Correlation(summary) => correlation(summary.as_ref()),
        AnalysisDetail::General(summary) => general(summary, report.data_points),
    };

    for highlight in &report.districts {
        answer.push_str(&district(highlight));
    }
    answer
}

/// Message for a query that could not be processed.
pub fn failure(error: &str) -> String {
    format!(
        "I encountered an error processing your query: {}. Please try rephrasing your question.",
        error
    )
}

/// Formats with `decimals` fraction digits and comma thousands separators.
pub fn with_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let grouped = match int_part.parse::<u64>() {
        Ok(n) => n.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn compare(summary: &CompareSummary) -> String {
    if summary.is_empty() {
        return "I found limited data for this comparison. Please try a different query.".to_string();
    }

    let mut out = String::from("Based on the analysis of data from data.gov.in:\n\n");

    if !summary.rainfall.is_empty() {
        out.push_str("**Rainfall Comparison:**\n");
        for state in &summary.rainfall {
            let _ = writeln!(out, "- {}: {:.1} mm average annual rainfall", state.name, state.value);
        }
        out.push('\n');
    }

    if !summary.crops.is_empty() {
        out.push_str("**Top Crops by State:**\n");
        for state in &summary.crops {
            let _ = writeln!(out, "\n*{}:*", state.state);
            for (i, crop) in state.crops.iter().take(CROPS_PER_STATE_LINES).enumerate() {
                let _ = writeln!(out, "  {}. {}: {} tonnes", i + 1, crop.crop, with_thousands(crop.production, 0));
            }
        }
    }
    out
}

fn top(n: usize, summary: &TopSummary) -> String {
    if summary.items.is_empty() {
        return format!("No data available for top {} analysis.", n);
    }

    let mut out = format!("**Top {} Results:**\n\n", n);
    for (i, item) in summary.items.iter().take(n).enumerate() {
        let _ = writeln!(out, "{}. {}: {} {}", i + 1, item.name, with_thousands(item.value, 1), item.unit);
    }
    out
}

fn trend(summary: Option<&TrendSummary>) -> String {
    let Some(trend) = summary else {
        return "Insufficient data for trend analysis.".to_string();
    };

    let mut out = format!("**Trend Analysis ({}):**\n\n", trend.metric);
    let _ = writeln!(out, "- Overall trend: {}", trend.direction.label());
    let _ = writeln!(out, "- Average growth rate: {:.2}% per year", trend.growth_rate);
    let _ = writeln!(out, "- Period covered: {} to {}", trend.start_year, trend.end_year);
    out
}

fn correlation(summary: Option<&CorrelationSummary>) -> String {
    let Some(corr) = summary else {
        return "Insufficient overlapping rainfall and production data for correlation analysis. \
                More than 5 matching state-year records are needed."
            .to_string();
    };

    let mut out = String::from("**Rainfall vs Production Correlation:**\n\n");
    let _ = writeln!(out, "- Pearson correlation coefficient: {:.3}", corr.coefficient);
    let _ = writeln!(out, "- Interpretation: {}", corr.interpretation);
    let _ = writeln!(
        out,
        "- P-value: {:.4} ({})",
        corr.p_value,
        if corr.significant { "significant" } else { "not significant" }
    );
    let _ = writeln!(out, "- Sample size: {} state-year records", corr.sample_size);
    out
}

fn general(summary: &GeneralSummary, data_points: usize) -> String {
    if summary.datasets.is_empty() {
        return "I found some data but couldn't generate a comprehensive answer. Please refine your query."
            .to_string();
    }

    const HEADER: &str = "**Analysis Results:**\n\n";
    let mut out = String::from(HEADER);

    if let Some(rainfall) = summary.dataset("rainfall") {
        out.push_str("**Rainfall Information:**\n");
        let _ = writeln!(out, "- Total records analyzed: {}", rainfall.record_count);
        if let Some(stats) = rainfall.stat("annual_rainfall_mm") {
            let _ = writeln!(out, "- Average annual rainfall: {:.1} mm", stats.mean);
            let _ = writeln!(out, "- Highest recorded rainfall: {:.1} mm", stats.max);
            let _ = writeln!(out, "- Lowest recorded rainfall: {:.1} mm", stats.min);
            let _ = writeln!(out, "- Median rainfall: {:.1} mm", stats.median);
        }
        out.push('\n');

        if !rainfall.sample.is_empty() {
            out.push_str("**Recent Data Points:**\n");
            for (i, row) in rainfall.sample.iter().take(SAMPLE_LINES).enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} ({}): {:.1} mm",
                    i + 1,
                    text(row, "state"),
                    text(row, "year"),
                    number(row, "annual_rainfall_mm")
                );
            }
            out.push('\n');
        }
    }

    if let Some(production) = summary.dataset("production") {
        out.push_str("**Crop Production Information:**\n");
        let _ = writeln!(out, "- Total production records: {}", production.record_count);
        if let Some(stats) = production.stat("production_tonnes") {
            let _ = writeln!(out, "- Average production: {} tonnes", with_thousands(stats.mean, 0));
            let _ = writeln!(out, "- Highest production: {} tonnes", with_thousands(stats.max, 0));
            let _ = writeln!(out, "- Lowest production: {} tonnes", with_thousands(stats.min, 0));
        }
        out.push('\n');

        if !production.sample.is_empty() {
            out.push_str("**Sample Production Records:**\n");
            for (i, row) in production.sample.iter().take(SAMPLE_LINES).enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} in {} ({}): {} tonnes",
                    i + 1,
                    text(row, "crop"),
                    text(row, "state"),
                    text(row, "year"),
                    with_thousands(number(row, "production_tonnes"), 0)
                );
            }
            out.push('\n');
        }
    }

    if out == HEADER {
        let _ = writeln!(
            out,
            "I found data for your query with {} data points. \
             The information includes details about the requested regions and time periods.",
            data_points
        );
    }
    out
}

fn district(highlight: &DistrictHighlight) -> String {
    let mut out = format!("\n**District Highlights for {}:**\n", highlight.state);
    let _ = writeln!(
        out,
        "- Highest: {} ({}) with {} tonnes",
        highlight.highest.district,
        highlight.highest.crop,
        with_thousands(highlight.highest.production, 0)
    );
    let _ = writeln!(
        out,
        "- Lowest: {} ({}) with {} tonnes",
        highlight.lowest.district,
        highlight.lowest.crop,
        with_thousands(highlight.lowest.production, 0)
    );
    let _ = writeln!(
        out,
        "- Average production: {} tonnes across {} districts",
        with_thousands(highlight.average_production, 0),
        highlight.district_count
    );
    out
}

fn text(row: &serde_json::Value, key: &str) -> String {
    match row.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "N/A".to_string(),
        Some(other) => other.to_string(),
    }
}

fn number(row: &serde_json::Value, key: &str) -> f64 {
    row.get(key).and_then(serde_json::Value::as_f64).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{NamedValue, RankedItem, TrendDirection, YearValue};
    use crate::query::{Intent, Metric};

    fn parsed(intent: Intent, top_n: usize) -> ParsedQuery {
        ParsedQuery {
            original_query: "q".to_string(),
            intent,
            intent_confidence: 0.9,
            states: vec![],
            crops: vec![],
            years: vec![],
            districts: vec![],
            metrics: vec![Metric::Rainfall, Metric::Production],
            top_n,
        }
    }

    fn report(detail: AnalysisDetail) -> AnalysisReport {
        AnalysisReport {
            detail,
            districts: vec![],
            data_points: 0,
            confidence: 0.0,
        }
    }

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(1234567.891, 0), "1,234,568");
        assert_eq!(with_thousands(999.0, 1), "999.0");
        assert_eq!(with_thousands(1000.0, 1), "1,000.0");
        assert_eq!(with_thousands(-12345.5, 1), "-12,345.5");
        assert_eq!(with_thousands(-0.01, 0), "0");
        assert_eq!(with_thousands(0.0, 2), "0.00");
        assert_eq!(with_thousands(98_765_432_100.0, 0), "98,765,432,100");
    }

    #[test]
    fn test_compare_answer() {
        let summary = CompareSummary {
            rainfall: vec![NamedValue {
                name: "Punjab".to_string(),
                value: 612.345,
            }],
            crops: vec![],
        };
        let answer = compose(&parsed(Intent::Compare, 5), &report(AnalysisDetail::Compare(summary)));
        assert!(answer.contains("- Punjab: 612.3 mm average annual rainfall"));

        let empty = compose(&parsed(Intent::Compare, 5), &report(AnalysisDetail::Compare(CompareSummary::default())));
        assert!(empty.starts_with("I found limited data"));
    }

    #[test]
    fn test_top_answer() {
        let summary = TopSummary {
            metric: Some(Metric::Production),
            items: vec![RankedItem {
                name: "Sugarcane".to_string(),
                value: 45000.0,
                unit: "tonnes".to_string(),
            }],
        };
        let answer = compose(&parsed(Intent::Top, 3), &report(AnalysisDetail::Top(summary)));
        assert!(answer.starts_with("**Top 3 Results:**"));
        assert!(answer.contains("1. Sugarcane: 45,000.0 tonnes"));

        let empty = compose(&parsed(Intent::Top, 3), &report(AnalysisDetail::Top(TopSummary::default())));
        assert_eq!(empty, "No data available for top 3 analysis.");
    }

    #[test]
    fn test_trend_answer() {
        let summary = TrendSummary {
            metric: Metric::Production,
            direction: TrendDirection::Increasing,
            growth_rate: 3.456,
            start_year: 2015,
            end_year: 2020,
            start_value: 1.0,
            end_value: 2.0,
            series: vec![YearValue { year: 2015, value: 1.0 }],
            trend_line: vec![],
            by_state: vec![],
        };
        let answer = compose(&parsed(Intent::Trend, 5), &report(AnalysisDetail::Trend(Some(summary))));
        assert!(answer.contains("- Overall trend: increasing"));
        assert!(answer.contains("- Average growth rate: 3.46% per year"));
        assert!(answer.contains("- Period covered: 2015 to 2020"));

        let empty = compose(&parsed(Intent::Trend, 5), &report(AnalysisDetail::Trend(None)));
        assert_eq!(empty, "Insufficient data for trend analysis.");
    }

    #[test]
    fn test_general_fallback_sentence() {
        let answer = general(&GeneralSummary::default(), 0);
        assert!(answer.starts_with("I found some data"));
    }

    #[test]
    fn test_correlation_answer() {
        let summary = CorrelationSummary {
            coefficient: 0.71234,
            p_value: 0.00123,
            significant: true,
            interpretation: "strong positive correlation".to_string(),
            sample_size: 12,
            points: vec![],
        };
        let answer = compose(
            &parsed(Intent::Correlation, 5),
            &report(AnalysisDetail::Correlation(Some(summary.clone()))),
        );
        assert!(answer.starts_with("**Rainfall vs Production Correlation:**"));
        assert!(answer.contains("- Pearson correlation coefficient: 0.712"));
        assert!(answer.contains("- Interpretation: strong positive correlation"));
        assert!(answer.contains("- P-value: 0.0012 (significant)"));
        assert!(answer.contains("- Sample size: 12 state-year records"));

        let weak = CorrelationSummary {
            coefficient: -0.1,
            p_value: 0.4,
            significant: false,
            ..summary
        };
        let answer = compose(
            &parsed(Intent::Correlation, 5),
            &report(AnalysisDetail::Correlation(Some(weak))),
        );
        assert!(answer.contains("- Pearson correlation coefficient: -0.100"));
        assert!(answer.contains("- P-value: 0.4000 (not significant)"));
    }

    #[test]
    fn test_correlation_answer_without_overlap() {
        let answer = compose(&parsed(Intent::Correlation, 5), &report(AnalysisDetail::Correlation(None)));
        assert!(answer.starts_with("Insufficient overlapping rainfall and production data for correlation analysis."));
        assert!(answer.contains("More than 5 matching state-year records are needed."));
        assert!(!answer.contains("Pearson"));
    }
}
