use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory layout under the configured data directory.
#[derive(Debug, Clone)]
pub struct PathManager {
    root: PathBuf,
}

impl PathManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Main data directory (./data by default).
    pub fn data_dir(&self) -> &Path {
        &self.root
    }

    /// Cached API responses (./data/cache).
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Query history and other logs (./data/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Creates the data, cache and logs directories if they don't exist.
    pub fn init(&self) -> Result<(), std::io::Error> {
        for dir in [self.root.clone(), self.cache_dir(), self.logs_dir()] {
            if !dir.exists() {
                info!("Creating directory: {:?}", dir);
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// All managed directories, for status reporting.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        vec![self.root.clone(), self.cache_dir(), self.logs_dir()]
    }
}
