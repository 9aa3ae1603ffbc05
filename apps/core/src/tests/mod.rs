//! Test Module
//!
//! Cross-module test suite for Project Samarth.
//!
//! ## Test Categories
//! - `fixtures`: record builders and an in-memory `DataSource`
//! - `query_tests`: parsing questions into intent and entities
//! - `analytics_tests`: trend thresholds, correlation, top-N and district highlights
//! - `engine_tests`: the full question-to-answer pipeline over a mock source
//! - `demo_tests`: the pipeline over the real fetcher in demo mode


pub mod demo_tests;
pub mod engine_tests;
