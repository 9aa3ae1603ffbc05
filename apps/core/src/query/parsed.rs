use serde::{Deserialize, Serialize};
use std::fmt;

use super::intent::Intent;

/// Quantity a query asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Rainfall,
    Production,
}

impl Metric {
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Rainfall => "mm",
            Metric::Production => "tonnes",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Rainfall => f.write_str("rainfall"),
            Metric::Production => f.write_str("production"),
        }
    }
}

/// Structured form of a natural-language question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub original_query: String,
    pub intent: Intent,
    pub intent_confidence: f32,
    pub states: Vec<String>,
    pub crops: Vec<String>,
    pub years: Vec<i32>,
    pub districts: Vec<String>,
    pub metrics: Vec<Metric>,
    pub top_n: usize,
}

impl ParsedQuery {
    pub fn wants(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }

    /// District data is fetched when districts are named or the word appears at all.
    pub fn wants_districts(&self) -> bool {
        !self.districts.is_empty() || self.original_query.to_lowercase().contains("district")
    }

    /// Crop passed to district lookups.
    pub fn primary_crop(&self) -> Option<&str> {
        self.crops.first().map(String::as_str)
    }
}
