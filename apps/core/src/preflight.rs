//! Status checks
//!
//! Verifies the pieces a query depends on: writable data directories, an API
//! key, and connectivity to each data.gov.in resource. Nothing is assumed.

use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

use crate::config::Settings;
use crate::data::DataFetcher;
use crate::fs_manager::PathManager;

const PROBE_FILENAME: &str = ".write_probe";

/// Result of a single check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub all_passed: bool,
    pub demo_mode: bool,
    pub checks: Vec<CheckResult>,
    /// Live API requests left in the hourly budget after the checks ran.
    pub remaining_requests: usize,
    pub summary: String,
}

/// Runs every check and logs the outcome.
pub async fn run_status_checks(settings: &Settings, paths: &PathManager, fetcher: &DataFetcher) -> StatusReport {
    info!("Running status checks");

    let mut checks = vec![check_directories(paths), check_api_key(settings)];
    let directories_ok = checks[0].passed;

    for status in fetcher.check_api_status().await {
        let name = format!("endpoint:{}", status.endpoint.key());
        checks.push(if status.reachable {
            CheckResult::pass(
                &name,
                &format!("{} reachable ({})", status.endpoint.display_name(), status.source),
            )
        } else {
            CheckResult::fail(
                &name,
                &format!("{} unavailable, demo data only", status.endpoint.display_name()),
                None,
            )
        });
    }

    let all_passed = checks.iter().all(|c| c.passed);
    let demo_mode = settings.is_demo_mode();

    let summary = if all_passed {
        "All checks passed. Live data available.".to_string()
    } else if !directories_ok {
        "Data directories are not usable. Caching and history will fail.".to_string()
    } else if demo_mode {
        "No API key configured. Running in demo mode with synthetic data.".to_string()
    } else {
        "Some endpoints are unreachable. Answers may use cached or demo data.".to_string()
    };

    for check in &checks {
        if check.passed {
            info!("  [ok] {}: {}", check.name, check.message);
        } else {
            warn!("  [failed] {}: {}", check.name, check.message);
            if let Some(details) = &check.details {
                warn!("      Details: {}", details);
            }
        }
    }
    let remaining_requests = fetcher.remaining_requests();
    info!("Summary: {}", summary);
    info!("Rate limit: {} requests left this hour", remaining_requests);

    StatusReport {
        all_passed,
        demo_mode,
        checks,
        remaining_requests,
        summary,
    }
}

fn check_directories(paths: &PathManager) -> CheckResult {
    let mut problems = Vec::new();
    let mut created = Vec::new();

    for dir in paths.all_dirs() {
        if !dir.exists() {
            match fs::create_dir_all(&dir) {
                Ok(_) => created.push(dir.display().to_string()),
                Err(e) => {
                    problems.push(format!("{}: {}", dir.display(), e));
                    continue;
                }
            }
        }

        let probe = dir.join(PROBE_FILENAME);
        match fs::write(&probe, b"ok").and_then(|_| fs::remove_file(&probe)) {
            Ok(_) => {}
            Err(e) => problems.push(format!("{} not writable: {}", dir.display(), e)),
        }
    }

    if !problems.is_empty() {
        return CheckResult::fail("directories", "Data directories unusable", Some(problems.join(", ")));
    }
    if created.is_empty() {
        CheckResult::pass("directories", "All directories exist and are writable")
    } else {
        CheckResult::pass(
            "directories",
            &format!("Created missing directories: {}", created.join(", ")),
        )
    }
}

fn check_api_key(settings: &Settings) -> CheckResult {
    if settings.is_demo_mode() {
        CheckResult::fail(
            "api_key",
            "DATA_GOV_API_KEY not set",
            Some("Get a key at https://data.gov.in and add it to .env".to_string()),
        )
    } else {
        CheckResult::pass("api_key", "API key configured")
    }
}
