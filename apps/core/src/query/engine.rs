use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use super::answer;
use super::entities::EntityExtractor;
use super::intent::{Intent, IntentClassifier};
use super::parsed::{Metric, ParsedQuery};
use crate::analytics::{AnalysisReport, AnalyticsEngine, QueryData};
use crate::data::DataSource;
use crate::error::AppError;
use crate::models::SourceCitation;
use crate::visualizer::{Chart, Visualizer};

/// Everything produced for one question.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub answer: String,
    pub query_type: Option<Intent>,
    pub parsed: Option<ParsedQuery>,
    pub analysis: Option<AnalysisReport>,
    pub charts: Vec<Chart>,
    pub sources: Vec<SourceCitation>,
    /// Datasets retrieved for the question.
    pub data: QueryData,
    pub confidence: f64,
    pub data_points: usize,
    pub processing_time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    fn failure(query: &str, err: &AppError, elapsed: f64) -> Self {
        let message = err.to_string();
        Self {
            query: query.to_string(),
            answer: answer::failure(&message),
            query_type: None,
            parsed: None,
            analysis: None,
            charts: Vec::new(),
            sources: Vec::new(),
            data: QueryData::default(),
            confidence: 0.0,
            data_points: 0,
            processing_time_secs: elapsed,
            error: Some(message),
        }
    }
}

/// Parses questions, fetches the data they need and answers them.
pub struct QueryEngine {
    source: Arc<dyn DataSource>,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    analytics: AnalyticsEngine,
    visualizer: Visualizer,
}

impl QueryEngine {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self::with_extractor(source, EntityExtractor::new())
    }

    /// Engine with a fixed entity extractor (e.g. a pinned current year).
    pub fn with_extractor(source: Arc<dyn DataSource>, extractor: EntityExtractor) -> Self {
        Self {
            source,
            classifier: IntentClassifier::new(),
            extractor,
            analytics: AnalyticsEngine::new(),
            visualizer: Visualizer::new(),
        }
    }

    /// Turns a question into intent and entities.
    pub fn parse(&self, query: &str) -> Result<ParsedQuery, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("query is empty".to_string()));
        }

        let intent = self.classifier.classify(query);
        Ok(ParsedQuery {
            original_query: query.to_string(),
            intent: intent.intent,
            intent_confidence: intent.confidence,
            states: self.extractor.states(query),
            crops: self.extractor.crops(query),
            years: self.extractor.years(query),
            districts: self.extractor.districts(query),
            metrics: self.extractor.metrics(query),
            top_n: self.extractor.top_n(query),
        })
    }

    /// Answers a question. Never fails: errors become the answer text.
    #[instrument(skip(self))]
    pub async fn process(&self, query: &str) -> QueryResponse {
        let started = Instant::now();
        info!("Processing query: {}", query);

        match self.try_process(query).await {
            Ok(mut response) => {
                response.processing_time_secs = started.elapsed().as_secs_f64();
                response
            }
            Err(e) => {
                error!("Error processing query: {}", e);
                QueryResponse::failure(query, &e, started.elapsed().as_secs_f64())
            }
        }
    }

    async fn try_process(&self, query: &str) -> Result<QueryResponse, AppError> {
        let parsed = self.parse(query)?;
        info!(
            intent = %parsed.intent,
            states = ?parsed.states,
            crops = ?parsed.crops,
            years = ?parsed.years,
            top_n = parsed.top_n,
            "Parsed query"
        );

        let data = self.fetch_data(&parsed).await;
        let analysis = self.analytics.analyze(&parsed, &data);
        let charts = self.visualizer.charts_for(&parsed, &analysis);
        let answer = answer::compose(&parsed, &analysis);

        Ok(QueryResponse {
            query: parsed.original_query.clone(),
            answer,
            query_type: Some(parsed.intent),
            sources: data.sources(),
            confidence: analysis.confidence,
            data_points: analysis.data_points,
            charts,
            analysis: Some(analysis),
            parsed: Some(parsed),
            data,
            processing_time_secs: 0.0,
            error: None,
        })
    }

    /// Fetches each dataset the query needs. A failed fetch is logged and skipped.
    async fn fetch_data(&self, parsed: &ParsedQuery) -> QueryData {
        let mut data = QueryData::default();
        if parsed.states.is_empty() {
            info!("No states recognised; nothing to fetch");
            return data;
        }

        if parsed.wants(Metric::Rainfall) {
            match self.source.rainfall(&parsed.states, &parsed.years).await {
                Ok(dataset) => data.rainfall = Some(dataset),
                Err(e) => error!("Error fetching rainfall data: {}", e),
            }
        }

        if parsed.wants(Metric::Production) {
            match self
                .source
                .crop_production(&parsed.states, &parsed.crops, &parsed.years)
                .await
            {
                Ok(dataset) => data.production = Some(dataset),
                Err(e) => error!("Error fetching production data: {}", e),
            }
        }

        if parsed.wants_districts() {
            for state in &parsed.states {
                match self.source.district_production(state, parsed.primary_crop()).await {
                    Ok(dataset) => data.districts.push(dataset),
                    Err(e) => error!("Error fetching district data for {}: {}", state, e),
                }
            }
        }

        if data.is_empty() {
            warn!(states = ?parsed.states, "No records retrieved for query");
        }
        data
    }
}
