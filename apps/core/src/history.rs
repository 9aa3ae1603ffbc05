//! Query history
//!
//! Every answered question is appended to `history.jsonl` in the logs
//! directory. Only the last 50 entries are kept so the file stays small.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let history = QueryHistory::new(paths.logs_dir());
//! history.record(&response)?;
//! for entry in history.recent(10) { println!("{}", entry.query); }
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::query::{Intent, QueryResponse};

/// Maximum number of entries kept in the history file
const MAX_ENTRIES: usize = 50;

const HISTORY_FILENAME: &str = "history.jsonl";

/// Characters of the answer kept in each entry
const ANSWER_PREVIEW_CHARS: usize = 200;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub query: String,
    pub intent: Option<Intent>,
    pub confidence: f64,
    pub data_points: usize,
    #[serde(default)]
    pub processing_time_secs: f64,
    /// Number of cited datasets.
    #[serde(default)]
    pub sources: usize,
    #[serde(default)]
    pub answer_preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals over a set of history entries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HistoryStats {
    pub queries: usize,
    pub failed: usize,
    pub total_sources: usize,
    pub total_data_points: usize,
    pub average_processing_secs: f64,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let total_secs: f64 = entries.iter().map(|e| e.processing_time_secs).sum();
        Self {
            queries: entries.len(),
            failed: entries.iter().filter(|e| e.error.is_some()).count(),
            total_sources: entries.iter().map(|e| e.sources).sum(),
            total_data_points: entries.iter().map(|e| e.data_points).sum(),
            average_processing_secs: total_secs / entries.len() as f64,
        }
    }
}

impl From<&QueryResponse> for HistoryEntry {
    fn from(response: &QueryResponse) -> Self {
        Self {
            timestamp: Local::now(),
            query: response.query.clone(),
            intent: response.query_type,
            confidence: response.confidence,
            data_points: response.data_points,
            processing_time_secs: response.processing_time_secs,
            sources: response.sources.len(),
            answer_preview: response.answer.chars().take(ANSWER_PREVIEW_CHARS).collect(),
            error: response.error.clone(),
        }
    }
}

pub struct QueryHistory {
    path: PathBuf,
}

impl QueryHistory {
    pub fn new(logs_dir: impl AsRef<Path>) -> Self {
        Self {
            path: logs_dir.as_ref().join(HISTORY_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, response: &QueryResponse) -> Result<(), AppError> {
        self.append(HistoryEntry::from(response))
    }

    /// Appends an entry, dropping the oldest beyond the limit.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), AppError> {
        let mut entries = self.entries();
        entries.push(entry);
        if entries.len() > MAX_ENTRIES {
            entries.drain(..entries.len() - MAX_ENTRIES);
        }
        self.write(&entries)
    }

    /// All stored entries, oldest first. Unreadable lines are skipped.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to open history file: {}", e);
                }
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(trimmed) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Failed to parse history entry: {} - line: {}", e, trimmed),
            }
        }
        entries
    }

    /// The newest `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut entries = self.entries();
        entries.reverse();
        entries.truncate(limit);
        entries
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_entries(&self.entries())
    }

    pub fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&self.path)?;

        writeln!(file, "# Project Samarth query history - last {} queries", entries.len())?;
        writeln!(file, "# Updated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "# Each line is a JSON object representing one query")?;
        writeln!(file)?;

        for entry in entries {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }

        debug!("Wrote {} history entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(query: &str) -> HistoryEntry {
        HistoryEntry {
            timestamp: Local::now(),
            query: query.to_string(),
            intent: Some(Intent::Compare),
            confidence: 0.7,
            data_points: 12,
            processing_time_secs: 0.5,
            sources: 2,
            answer_preview: "Based on the analysis".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path());

        history.append(entry("first")).unwrap();
        history.append(entry("second")).unwrap();

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "first");
        assert_eq!(history.recent(1)[0].query, "second");

        let raw = fs::read_to_string(history.path()).unwrap();
        assert!(raw.starts_with("# Project Samarth query history"));
    }

    #[test]
    fn test_keeps_only_last_entries() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path());

        for i in 0..(MAX_ENTRIES + 5) {
            history.append(entry(&format!("q{}", i))).unwrap();
        }

        let entries = history.entries();
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].query, "q5");
    }

    #[test]
    fn test_skips_corrupt_lines_and_clears() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path());
        history.append(entry("ok")).unwrap();

        let mut raw = fs::read_to_string(history.path()).unwrap();
        raw.push_str("{not json}\n");
        fs::write(history.path(), raw).unwrap();

        assert_eq!(history.entries().len(), 1);

        history.clear().unwrap();
        assert!(history.entries().is_empty());
        history.clear().unwrap();
    }

    #[test]
    fn test_entry_from_response_keeps_answer_preview() {
        let response = QueryResponse {
            query: "Rainfall in Kerala".to_string(),
            answer: "é".repeat(ANSWER_PREVIEW_CHARS + 40),
            processing_time_secs: 1.25,
            data_points: 7,
            ..QueryResponse::default()
        };

        let entry = HistoryEntry::from(&response);
        assert_eq!(entry.answer_preview.chars().count(), ANSWER_PREVIEW_CHARS);
        assert_eq!(entry.processing_time_secs, 1.25);
        assert_eq!(entry.sources, 0);
        assert_eq!(entry.data_points, 7);
    }

    #[test]
    fn test_stats_totals() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path());
        assert_eq!(history.stats(), HistoryStats::default());

        history.append(entry("first")).unwrap();
        let mut failed = entry("second");
        failed.processing_time_secs = 1.5;
        failed.sources = 0;
        failed.error = Some("boom".to_string());
        history.append(failed).unwrap();

        let stats = history.stats();
        assert_eq!(stats.queries, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_sources, 2);
        assert_eq!(stats.total_data_points, 24);
        assert!((stats.average_processing_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reads_entries_without_newer_fields() {
        let dir = tempdir().unwrap();
        let history = QueryHistory::new(dir.path());
        fs::write(
            history.path(),
            "# header\n{\"timestamp\":\"2025-01-02T10:00:00+05:30\",\"query\":\"old\",\"intent\":\"trend\",\"confidence\":0.8,\"data_points\":3}\n",
        )
        .unwrap();

        let entries = history.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sources, 0);
        assert!(entries[0].answer_preview.is_empty());
    }
}
