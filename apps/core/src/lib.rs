//! Project Samarth: natural-language questions over Indian agricultural and
//! rainfall open data.
//!
//! A question flows through [`query::QueryEngine`]: intent classification and
//! entity extraction, a fetch through [`data::DataSource`] (live API, cache or
//! demo data), analysis in [`analytics`] and chart specs from [`visualizer`].

pub mod analytics;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod fs_manager;
pub mod history;
pub mod logging;
pub mod models;
pub mod preflight;
pub mod query;
pub mod rate_limiter;
pub mod visualizer;

#[cfg(test)]
mod tests;
