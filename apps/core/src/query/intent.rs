//! Intent classification using regex patterns.
//!
//! Groups are tried in a fixed order and the first group with a matching
//! pattern wins. Queries matching nothing get a low-confidence default.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Coarse category of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Side-by-side comparison of states
    Compare,
    /// Ranking ("top 5 crops")
    Top,
    /// Change over time
    Trend,
    /// Rainfall versus production relationship
    Correlation,
    /// Anything else
    General,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Compare => "compare",
            Intent::Top => "top",
            Intent::Trend => "trend",
            Intent::Correlation => "correlation",
            Intent::General => "general",
        }
    }
}

/// Result of intent classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Text fragments that matched
    pub matched_patterns: Vec<String>,
}

pub const EXPLICIT_CONFIDENCE: f32 = 0.9;
pub const GENERAL_CONFIDENCE: f32 = 0.5;
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

struct IntentPattern {
    intent: Intent,
    patterns: Vec<Regex>,
}

pub struct IntentClassifier {
    patterns: Vec<IntentPattern>,
}

static COMPARE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(compare|comparison|versus|vs)\b").expect("Invalid regex: compare verbs"),
        Regex::new(r"(?i)\bdifference\s+between\b").expect("Invalid regex: difference between"),
    ]
});

static TOP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?i)\b(top|best|highest|maximum|most)\s+\d+\b").expect("Invalid regex: ranking with count")]
});

static TREND_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(trends?|historical|growth|decline)\b").expect("Invalid regex: trend words"),
        Regex::new(r"(?i)\bover\s+time\b").expect("Invalid regex: over time"),
    ]
});

static CORRELATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?i)\b(correlation|correlate[ds]?|relationship|impact|effects?)\b")
        .expect("Invalid regex: correlation words")]
});

static GENERAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(what|which|list)\b").expect("Invalid regex: general question words"));

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        // Order matters: "compare the growth" is a comparison, not a trend.
        let patterns = vec![
            IntentPattern {
                intent: Intent::Compare,
                patterns: COMPARE_PATTERNS.clone(),
            },
            IntentPattern {
                intent: Intent::Top,
                patterns: TOP_PATTERNS.clone(),
            },
            IntentPattern {
                intent: Intent::Trend,
                patterns: TREND_PATTERNS.clone(),
            },
            IntentPattern {
                intent: Intent::Correlation,
                patterns: CORRELATION_PATTERNS.clone(),
            },
        ];

        Self { patterns }
    }

    pub fn classify(&self, text: &str) -> IntentResult {
        let text = text.trim();

        for group in &self.patterns {
            let matched: Vec<String> = group
                .patterns
                .iter()
                .filter_map(|p| p.find(text))
                .map(|m| m.as_str().to_string())
                .collect();

            if !matched.is_empty() {
                return IntentResult {
                    intent: group.intent,
                    confidence: EXPLICIT_CONFIDENCE,
                    matched_patterns: matched,
                };
            }
        }

        match GENERAL_PATTERN.find(text) {
            Some(m) => IntentResult {
                intent: Intent::General,
                confidence: GENERAL_CONFIDENCE,
                matched_patterns: vec![m.as_str().to_string()],
            },
            None => IntentResult {
                intent: Intent::Compare,
                confidence: FALLBACK_CONFIDENCE,
                matched_patterns: vec![],
            },
        }
    }
}
