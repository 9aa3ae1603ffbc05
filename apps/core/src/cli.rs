//! Command-line front end.
//!
//! `main` parses [`Cli`], loads settings and hands over to [`run`].

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::vocabulary::SAMPLE_QUERIES;
use crate::config::{Endpoint, Settings, APP_NAME, APP_VERSION};
use crate::data::DataFetcher;
use crate::fs_manager::PathManager;
use crate::history::QueryHistory;
use crate::preflight::run_status_checks;
use crate::query::{QueryEngine, QueryResponse};
use crate::visualizer::render_text;

#[derive(Debug, Parser)]
#[command(name = "samarth", version, about = "Ask questions about Indian agriculture and rainfall data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a natural-language question
    Ask {
        /// The question, e.g. "Compare rainfall in Punjab and Haryana"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
        /// Write chart specifications to this file
        #[arg(long, value_name = "FILE")]
        charts: Option<PathBuf>,
        /// Skip the text rendering of charts
        #[arg(long)]
        no_charts: bool,
    },
    /// Check directories, API key and endpoint connectivity
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Remove cached API responses
    ClearCache {
        /// Only clear this endpoint (e.g. imd_rainfall)
        #[arg(long)]
        endpoint: Option<Endpoint>,
    },
    /// Show recently asked questions
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Delete the history instead of showing it
        #[arg(long)]
        clear: bool,
    },
    /// List example questions
    Samples,
}

/// Executes one command against the given settings.
pub async fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    let paths = PathManager::new(settings.data_dir.clone());

    match cli.command {
        Command::Ask {
            query,
            json,
            charts,
            no_charts,
        } => {
            paths.init().context("failed to create data directories")?;
            let fetcher = DataFetcher::new(settings, &paths)?;
            if fetcher.settings().is_demo_mode() {
                warn!("DATA_GOV_API_KEY not set, answering from demo data");
            }
            let engine = QueryEngine::new(Arc::new(fetcher));

            let response = engine.process(&query.join(" ")).await;

            let history = QueryHistory::new(paths.logs_dir());
            if let Err(e) = history.record(&response) {
                warn!("Failed to record query history: {}", e);
            }

            if let Some(path) = charts {
                let body = serde_json::to_string_pretty(&response.charts)?;
                fs::write(&path, body).with_context(|| format!("failed to write charts to {}", path.display()))?;
                info!("Wrote {} chart(s) to {}", response.charts.len(), path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response, !no_charts);
            }
        }
        Command::Status { json } => {
            let fetcher = DataFetcher::new(settings.clone(), &paths)?;
            let report = run_status_checks(&settings, &paths, &fetcher).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} v{}", APP_NAME, APP_VERSION);
                for check in &report.checks {
                    let mark = if check.passed { "ok" } else { "!!" };
                    println!("  [{}] {}: {}", mark, check.name, check.message);
                    if let Some(details) = &check.details {
                        println!("       {}", details);
                    }
                }
                println!("{}", report.summary);
                println!("API requests left this hour: {}", report.remaining_requests);
            }
        }
        Command::ClearCache { endpoint } => {
            let fetcher = DataFetcher::new(settings, &paths)?;
            let removed = fetcher.clear_cache(endpoint)?;
            match endpoint {
                Some(endpoint) => println!("Removed {} cached response(s) for {}", removed, endpoint),
                None => println!("Removed {} cached response(s)", removed),
            }
        }
        Command::History { limit, clear } => {
            let history = QueryHistory::new(paths.logs_dir());
            if clear {
                history.clear()?;
                println!("History cleared");
                return Ok(());
            }
            let entries = history.recent(limit);
            if entries.is_empty() {
                println!("No queries yet. Try: samarth ask \"{}\"", SAMPLE_QUERIES[0]);
            }
            for entry in entries {
                let intent = entry.intent.map(|i| i.label()).unwrap_or("error");
                println!(
                    "{}  [{:<11}] {:>3.0}%  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    intent,
                    entry.confidence * 100.0,
                    entry.query
                );
            }

            let stats = history.stats();
            if stats.queries > 0 {
                println!();
                println!(
                    "{} queries ({} failed) | Sources cited: {} | Data points: {} | Avg time: {:.2}s",
                    stats.queries,
                    stats.failed,
                    stats.total_sources,
                    stats.total_data_points,
                    stats.average_processing_secs
                );
            }
        }
        Command::Samples => {
            for (i, sample) in SAMPLE_QUERIES.iter().enumerate() {
                println!("{:>2}. {}", i + 1, sample);
            }
        }
    }

    Ok(())
}

fn print_response(response: &QueryResponse, with_charts: bool) {
    println!("{}", response.answer);

    if with_charts {
        for chart in &response.charts {
            println!();
            println!("{}", render_text(chart));
        }
    }

    if !response.data.is_empty() {
        println!();
        println!("Retrieved data:");
        for (name, count) in response.data.record_counts() {
            println!("  - {}: {} records", name, count);
        }
    }

    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &response.sources {
            println!("  - {}", source.summary());
        }
    }

    println!();
    println!(
        "Confidence: {:.0}% | Data points: {} | Time: {:.2}s",
        response.confidence * 100.0,
        response.data_points,
        response.processing_time_secs
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_joins_words() {
        let cli = Cli::try_parse_from(["samarth", "ask", "top", "3", "crops", "--json"]).unwrap();
        match cli.command {
            Command::Ask { query, json, .. } => {
                assert_eq!(query.join(" "), "top 3 crops");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_clear_cache_endpoint() {
        let cli = Cli::try_parse_from(["samarth", "clear-cache", "--endpoint", "imd_rainfall"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::ClearCache {
                endpoint: Some(Endpoint::ImdRainfall)
            }
        ));

        assert!(Cli::try_parse_from(["samarth", "clear-cache", "--endpoint", "weather"]).is_err());
    }

    #[test]
    fn test_history_defaults() {
        let cli = Cli::try_parse_from(["samarth", "history"]).unwrap();
        assert!(matches!(cli.command, Command::History { limit: 10, clear: false }));
    }

    #[test]
    fn test_ask_requires_query() {
        assert!(Cli::try_parse_from(["samarth", "ask"]).is_err());
    }
}
