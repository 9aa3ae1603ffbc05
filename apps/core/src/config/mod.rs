//! # Config Module
//!
//! Environment-derived settings and the static lookup tables used by entity
//! extraction.
//!
//! ## Components
//! - `settings`: `Settings` loaded from `.env` / the environment, plus the `Endpoint` catalogue
//! - `vocabulary`: states, abbreviations, crops and crop categories

pub mod settings;
pub mod vocabulary;

pub use settings::{ApiQuery, Endpoint, Settings, APP_NAME, APP_VERSION};
