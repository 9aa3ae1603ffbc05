//! Natural-language query handling.
//!
//! - `intent`: regex intent classification
//! - `entities`: states, crops, years and friends
//! - `engine`: the parse, fetch, analyse, answer pipeline
//! - `answer`: per-intent answer templates

pub mod answer;
pub mod engine;
pub mod entities;
pub mod intent;
pub mod parsed;

pub use engine::{QueryEngine, QueryResponse};
pub use entities::EntityExtractor;
pub use intent::{Intent, IntentClassifier, IntentResult};
pub use parsed::{Metric, ParsedQuery};
