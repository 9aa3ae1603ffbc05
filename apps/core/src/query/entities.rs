//! Entity extraction: states, crops, years, districts, metrics and ranking size.
//!
//! Everything is vocabulary or regex driven. Relative year expressions are
//! resolved against a configurable current year so results are testable.

use chrono::{Datelike, Local};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::parsed::Metric;
use crate::config::vocabulary::{CROP_CATEGORIES, INDIAN_STATES, MAJOR_CROPS, STATE_ABBREVIATIONS};

pub const DEFAULT_TOP_N: usize = 5;
const DEFAULT_YEAR_SPAN: i32 = 5;
const DECADE: i32 = 10;
/// Upper bound for "last N years".
const MAX_RELATIVE_YEARS: i32 = 100;

static STATE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let full = INDIAN_STATES.iter().map(|state| {
        let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(state))).expect("Invalid regex: state name");
        (re, *state)
    });
    // Case-sensitive: "up" and "as" are ordinary words.
    let abbreviations = STATE_ABBREVIATIONS.iter().map(|(abbr, state)| {
        let re = Regex::new(&format!(r"\b{}\b", abbr)).expect("Invalid regex: state abbreviation");
        (re, *state)
    });
    full.chain(abbreviations).collect()
});

static CROP_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    MAJOR_CROPS
        .iter()
        .map(|crop| {
            let re = Regex::new(&format!(r"(?i)\b{}(?:e?s)?\b", regex::escape(crop))).expect("Invalid regex: crop name");
            (re, *crop)
        })
        .collect()
});

static CATEGORY_PATTERNS: LazyLock<Vec<(Regex, &'static [&'static str])>> = LazyLock::new(|| {
    CROP_CATEGORIES
        .iter()
        .map(|(category, crops)| {
            let pattern = regex::escape(category).replace('_', "[ _]");
            let re = Regex::new(&format!(r"(?i)\b{}\b", pattern)).expect("Invalid regex: crop category");
            (re, *crops)
        })
        .collect()
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("Invalid regex: year"));

static YEAR_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|to)\s*((?:19|20)\d{2})\b").expect("Invalid regex: year range")
});

static LAST_N_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:last|past)\s+(\d+)\s+years?\b").expect("Invalid regex: last n years"));

/// "last decade", "past decade", "over the decade", "over the last decade".
static LAST_DECADE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:over\s+(?:the\s+)?(?:(?:last|past)\s+)?|(?:last|past)\s+)decade\b")
        .expect("Invalid regex: last decade")
});

static TOP_N: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\btop\s+(\d+)\b").expect("Invalid regex: top n"));

static N_BEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s+(?:most|best|highest)\b").expect("Invalid regex: n best"));

static DISTRICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-Za-z]+)\s+district\b").expect("Invalid regex: district"));

static RAINFALL_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(rainfall|precipitation|monsoon)\b").expect("Invalid regex: rainfall words"));

static PRODUCTION_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(production|yield|output|harvest)\b").expect("Invalid regex: production words")
});

/// Words that can precede "district" without naming one.
const DISTRICT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "best", "by", "each", "every", "for", "highest", "in", "lowest", "most", "of",
    "one", "per", "that", "the", "this", "top", "what", "which", "with",
];

pub struct EntityExtractor {
    current_year: i32,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self::with_current_year(Local::now().year())
    }

    pub fn with_current_year(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// States in order of first mention, without duplicates.
    pub fn states(&self, query: &str) -> Vec<String> {
        let mut found: Vec<(usize, &'static str)> = STATE_PATTERNS
            .iter()
            .filter_map(|(re, state)| re.find(query).map(|m| (m.start(), *state)))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);

        let mut states: Vec<String> = Vec::with_capacity(found.len());
        for (_, state) in found {
            if !states.iter().any(|s| s == state) {
                states.push(state.to_string());
            }
        }
        states
    }

    /// Named crops plus the members of any named category, sorted.
    pub fn crops(&self, query: &str) -> Vec<String> {
        let mut crops: BTreeSet<&str> = CROP_PATTERNS
            .iter()
            .filter(|(re, _)| re.is_match(query))
            .map(|(_, crop)| *crop)
            .collect();

        for (re, members) in CATEGORY_PATTERNS.iter() {
            if re.is_match(query) {
                crops.extend(members.iter().copied());
            }
        }

        crops.into_iter().map(str::to_string).collect()
    }

    /// Years mentioned, expanded from ranges and relative phrases, sorted.
    pub fn years(&self, query: &str) -> Vec<i32> {
        let mut years = BTreeSet::new();

        for m in YEAR.find_iter(query) {
            if let Ok(year) = m.as_str().parse::<i32>() {
                years.insert(year);
            }
        }

        for caps in YEAR_RANGE.captures_iter(query) {
            let (Ok(a), Ok(b)) = (caps[1].parse::<i32>(), caps[2].parse::<i32>()) else {
                continue;
            };
            years.extend(a.min(b)..=a.max(b));
        }

        // Relative phrases replace anything explicit.
        if let Some(n) = LAST_N_YEARS
            .captures(query)
            .and_then(|caps| caps[1].parse::<i32>().ok())
            .filter(|n| *n > 0)
        {
            return self.years_before(n.min(MAX_RELATIVE_YEARS));
        }

        if LAST_DECADE.is_match(query) {
            return self.years_before(DECADE);
        }

        if years.is_empty() {
            return self.years_before(DEFAULT_YEAR_SPAN);
        }

        years.into_iter().collect()
    }

    /// The `n` years ending the year before the current one.
    fn years_before(&self, n: i32) -> Vec<i32> {
        (self.current_year - n..self.current_year).collect()
    }

    pub fn top_n(&self, query: &str) -> usize {
        TOP_N
            .captures(query)
            .or_else(|| N_BEST.captures(query))
            .and_then(|caps| caps[1].parse::<usize>().ok())
            .unwrap_or(DEFAULT_TOP_N)
            .max(1)
    }

    pub fn districts(&self, query: &str) -> Vec<String> {
        let mut districts: Vec<String> = Vec::new();
        for caps in DISTRICT.captures_iter(query) {
            let word = &caps[1];
            if DISTRICT_STOPWORDS.contains(&word.to_lowercase().as_str()) {
                continue;
            }
            let name = capitalize(word);
            if !districts.contains(&name) {
                districts.push(name);
            }
        }
        districts
    }

    /// Metrics mentioned; both when the query names neither.
    pub fn metrics(&self, query: &str) -> Vec<Metric> {
        let mut metrics = Vec::with_capacity(2);
        if RAINFALL_WORDS.is_match(query) {
            metrics.push(Metric::Rainfall);
        }
        if PRODUCTION_WORDS.is_match(query) {
            metrics.push(Metric::Production);
        }
        if metrics.is_empty() {
            metrics = vec![Metric::Rainfall, Metric::Production];
        }
        metrics
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::with_current_year(2025)
    }

    #[test]
    fn test_states_full_names_and_abbreviations() {
        let ex = extractor();

        assert_eq!(ex.states("Compare Punjab and haryana"), vec!["Punjab", "Haryana"]);
        assert_eq!(ex.states("wheat in UP and MP"), vec!["Uttar Pradesh", "Madhya Pradesh"]);
        assert_eq!(ex.states("Uttar Pradesh vs UP"), vec!["Uttar Pradesh"]);
    }

    #[test]
    fn test_lowercase_abbreviations_are_ordinary_words() {
        let ex = extractor();

        assert!(ex.states("as rainfall goes up").is_empty());
        assert!(ex.states("Punjabi food").is_empty());
    }

    #[test]
    fn test_crops_plural_and_categories() {
        let ex = extractor();

        assert_eq!(ex.crops("rice and wheat"), vec!["Rice", "Wheat"]);
        assert_eq!(ex.crops("Potatoes and tomatoes"), vec!["Potato", "Tomato"]);
        assert_eq!(
            ex.crops("cash crops in Gujarat"),
            vec!["Coffee", "Cotton", "Jute", "Sugarcane", "Tea", "Tobacco"]
        );
        // "Teak" is not "Tea".
        assert!(ex.crops("Teak plantations").is_empty());
    }

    #[test]
    fn test_explicit_years_and_ranges() {
        let ex = extractor();

        assert_eq!(ex.years("rice in 2015 and 2018"), vec![2015, 2018]);
        assert_eq!(ex.years("rice 2015-2018"), vec![2015, 2016, 2017, 2018]);
        assert_eq!(ex.years("from 2012 to 2010"), vec![2010, 2011, 2012]);
    }

    #[test]
    fn test_relative_years() {
        let ex = extractor();

        assert_eq!(ex.years("rainfall for last 3 years"), vec![2022, 2023, 2024]);
        assert_eq!(ex.years("over the past decade"), (2015..2025).collect::<Vec<_>>());
        assert_eq!(
            ex.years("How has rice production changed over the decade in Punjab?"),
            (2015..2025).collect::<Vec<_>>()
        );
        assert_eq!(ex.years("over decade"), (2015..2025).collect::<Vec<_>>());
        assert_eq!(ex.years("a decade of data").len(), 5);
        assert_eq!(ex.years("rainfall in Kerala"), vec![2020, 2021, 2022, 2023, 2024]);
        assert_eq!(ex.years("last 0 years").len(), 5);
    }

    #[test]
    fn test_top_n() {
        let ex = extractor();

        assert_eq!(ex.top_n("Top 3 crops"), 3);
        assert_eq!(ex.top_n("the 7 highest states"), 7);
        assert_eq!(ex.top_n("best crops"), DEFAULT_TOP_N);
        assert_eq!(ex.top_n("top 0 crops"), 1);
    }

    #[test]
    fn test_districts_skip_stopwords() {
        let ex = extractor();

        assert_eq!(ex.districts("wheat in ludhiana district"), vec!["Ludhiana"]);
        assert!(ex.districts("which district has the most rice").is_empty());
        assert!(ex.districts("the district with highest wheat").is_empty());
    }

    #[test]
    fn test_metrics() {
        let ex = extractor();

        assert_eq!(ex.metrics("monsoon in Kerala"), vec![Metric::Rainfall]);
        assert_eq!(ex.metrics("rice yield"), vec![Metric::Production]);
        assert_eq!(ex.metrics("Punjab"), vec![Metric::Rainfall, Metric::Production]);
    }
}
