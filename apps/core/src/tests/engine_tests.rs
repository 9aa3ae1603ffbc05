//! Query Engine Tests
//!
//! End-to-end question answering over the in-memory `MockSource`.

use std::sync::Arc;

use super::fixtures::{district, production, rainfall, MockSource};
use crate::analytics::AnalysisDetail;
use crate::query::{EntityExtractor, Intent, QueryEngine};
use crate::visualizer::ChartKind;

fn source() -> MockSource {
    let mut source = MockSource::default();
    for (i, year) in (2020..2025).enumerate() {
        let step = i as f64;
        source.rainfall.push(rainfall("Punjab", year, 600.0 + step * 20.0));
        source.rainfall.push(rainfall("Haryana", year, 500.0 - step * 10.0));
        source.production.push(production("Punjab", "Wheat", year, 17000.0 + step * 500.0));
        source.production.push(production("Punjab", "Rice", year, 12000.0 + step * 300.0));
        source.production.push(production("Haryana", "Wheat", year, 11000.0 + step * 200.0));
        source.production.push(production("Maharashtra", "Cotton", year, 8000.0));
        source.production.push(production("Maharashtra", "Sugarcane", year, 90000.0));
        source.production.push(production("Maharashtra", "Rice", year, 3000.0));
        source.production.push(production("Maharashtra", "Maize", year, 2500.0));
    }
    source.districts = vec![
        district("Uttar Pradesh", "Meerut", "Wheat", 4200.0),
        district("Uttar Pradesh", "Agra", "Wheat", 1800.0),
        district("Uttar Pradesh", "Kanpur", "Wheat", 3000.0),
    ];
    source
}

fn engine_with(source: Arc<MockSource>) -> QueryEngine {
    QueryEngine::with_extractor(source, EntityExtractor::with_current_year(2025))
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_query_becomes_error_answer() {
        let source = Arc::new(source());
        let engine = engine_with(source.clone());

        let response = engine.process("   ").await;

        assert!(response.error.is_some());
        assert!(response.answer.starts_with("I encountered an error processing your query"));
        assert_eq!(response.confidence, 0.0);
        assert!(response.query_type.is_none());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_top_three_crops() {
        let engine = engine_with(Arc::new(source()));

        let response = engine.process("Top 3 crops produced in Maharashtra").await;

        assert!(response.error.is_none());
        assert_eq!(response.query_type, Some(Intent::Top));
        let Some(AnalysisDetail::Top(summary)) = response.analysis.as_ref().map(|a| &a.detail) else {
            panic!("expected a ranking");
        };
        let names: Vec<&str> = summary.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Sugarcane", "Cotton", "Rice"]);
        assert!(response.answer.contains("**Top 3 Results:**"));
        assert!(response.charts.iter().any(|c| c.kind == ChartKind::Pie));
    }

    #[tokio::test]
    async fn test_compare_two_states_for_a_crop() {
        let source = Arc::new(source());
        let engine = engine_with(source.clone());

        let response = engine.process("Compare wheat production in Punjab and Haryana").await;

        assert_eq!(response.query_type, Some(Intent::Compare));
        let parsed = response.parsed.as_ref().unwrap();
        assert_eq!(parsed.crops, vec!["Wheat"]);

        let Some(AnalysisDetail::Compare(summary)) = response.analysis.as_ref().map(|a| &a.detail) else {
            panic!("expected a comparison");
        };
        let states: Vec<&str> = summary.crops.iter().map(|s| s.state.as_str()).collect();
        assert_eq!(states, vec!["Haryana", "Punjab"]);
        assert!(summary.crops.iter().all(|s| s.crops.iter().all(|c| c.crop == "Wheat")));

        // Production only: rainfall is not requested.
        assert_eq!(source.calls(), 1);
        assert_eq!(*source.requested_states.lock().unwrap(), vec!["Punjab", "Haryana"]);
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.data_points, 10);
        assert!(response.answer.starts_with("Based on the analysis of data from data.gov.in:"));
    }

    #[tokio::test]
    async fn test_no_states_means_no_fetch() {
        let source = Arc::new(source());
        let engine = engine_with(source.clone());

        let response = engine.process("Compare rainfall across the country").await;

        assert!(response.error.is_none());
        assert_eq!(source.calls(), 0);
        assert!(response.data.is_empty());
        assert_eq!(response.data_points, 0);
        assert_eq!(response.confidence, 0.0);
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn test_district_highlights_are_attached() {
        let engine = engine_with(Arc::new(source()));

        let response = engine.process("District with highest wheat production in UP").await;

        let analysis = response.analysis.as_ref().unwrap();
        assert_eq!(analysis.districts.len(), 1);
        assert_eq!(analysis.districts[0].highest.district, "Meerut");
        assert!(response.answer.contains("Meerut"));
        assert!(response.charts.iter().any(|c| c.kind == ChartKind::Heatmap));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped() {
        let mut source = source();
        source.fail_rainfall = true;
        let engine = engine_with(Arc::new(source));

        let response = engine.process("Rainfall and wheat production trend in Punjab").await;

        assert!(response.error.is_none());
        assert_eq!(response.query_type, Some(Intent::Trend));
        assert_eq!(response.sources.len(), 1);
        let Some(AnalysisDetail::Trend(Some(summary))) = response.analysis.as_ref().map(|a| &a.detail) else {
            panic!("expected a production trend");
        };
        assert_eq!(summary.start_year, 2020);
        assert_eq!(summary.end_year, 2024);
    }

    #[tokio::test]
    async fn test_response_serializes() {
        let engine = engine_with(Arc::new(source()));

        let response = engine.process("Impact of rainfall on production in Punjab").await;
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["query_type"], "correlation");
        assert!(value.get("error").is_none());
        assert!(value["charts"].is_array());

        // Retrieved datasets travel with the answer.
        assert_eq!(value["data"]["rainfall"]["records"].as_array().unwrap().len(), 5);
        assert_eq!(value["data"]["production"]["records"].as_array().unwrap().len(), 10);
        assert_eq!(value["data"]["rainfall"]["records"][0]["state"], "Punjab");
        assert!(value["data"]["districts"].as_array().unwrap().is_empty());
        assert_eq!(response.data.record_counts().len(), 2);
    }
}
