use std::io;
use thiserror::Error;

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents standard input/output errors (cache files, history, directories).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents failures talking to the open-data API.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents a cache entry that exists but could not be used.
    #[error("Cache error: {0}")]
    Cache(String),

    /// An endpoint name that is not part of the catalogue.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Represents an error indicating that the hourly request budget is spent.
    #[error("Rate limit exceeded, retry in {0}s")]
    RateLimited(u64),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Http(s) => AppError::Http(s.clone()),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Cache(s) => AppError::Cache(s.clone()),
            AppError::UnknownEndpoint(s) => AppError::UnknownEndpoint(s.clone()),
            AppError::RateLimited(secs) => AppError::RateLimited(*secs),
            AppError::Internal(s) => AppError::Internal(s.clone()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::Http(format!("status {}: {}", status, err)),
            None => AppError::Http(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_preserves_message() {
        let err = AppError::Io(io::Error::new(io::ErrorKind::NotFound, "cache dir missing"));
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_json_error_maps_to_validation() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_rate_limited_message() {
        assert_eq!(
            AppError::RateLimited(42).to_string(),
            "Rate limit exceeded, retry in 42s"
        );
    }
}
