//! Tracing subscriber setup.
//!
//! Logs go to stderr so that answers and JSON printed on stdout stay clean.
//! `RUST_LOG` overrides the configured level when set.

use std::env;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::AppError;

const FORMAT_VAR: &str = "SAMARTH_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("{} must be 'pretty' or 'json', got '{}'", FORMAT_VAR, other))),
        }
    }
}

/// Filter directive for the configured level; `debug` forces debug output.
pub fn directive(level: &str, debug: bool) -> String {
    if debug {
        "debug".to_string()
    } else {
        level.trim().to_lowercase()
    }
}

/// Installs the global subscriber. Call once, early in `main`.
pub fn init(level: &str, debug: bool) -> Result<(), AppError> {
    let directive = directive(level, debug);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directive)
            .map_err(|e| AppError::Config(format!("invalid LOG_LEVEL '{}': {}", directive, e)))?,
    };

    let format = match env::var(FORMAT_VAR) {
        Ok(raw) => raw.parse()?,
        Err(_) => LogFormat::default(),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| AppError::Internal(format!("logging already initialised: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_directive() {
        assert_eq!(directive("INFO", false), "info");
        assert_eq!(directive("warn", true), "debug");
    }
}
