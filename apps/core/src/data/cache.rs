//! Disk-backed response cache.
//!
//! One JSON file per request, named by the SHA-256 of the endpoint and the
//! canonical request parameters. The file's modification time is the expiry
//! clock.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};

use crate::config::{ApiQuery, Endpoint};
use crate::error::AppError;
use crate::models::ApiResponse;

pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            enabled,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache key for a request. The API key is deliberately not part of it.
    pub fn key(endpoint: Endpoint, query: &ApiQuery) -> String {
        // ApiQuery serializes with a fixed field order and sorted filters.
        let canonical = serde_json::to_string(query).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(endpoint.key().as_bytes());
        hasher.update(b"_");
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// True if the entry exists, caching is enabled and it is younger than the TTL.
    pub fn is_fresh(&self, path: &Path) -> bool {
        if !self.enabled {
            return false;
        }
        match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => match SystemTime::now().duration_since(modified) {
                Ok(age) => age < self.ttl,
                // mtime in the future: clock skew, treat as just written
                Err(_) => true,
            },
            Err(_) => false,
        }
    }

    /// Returns the stored response if it has not expired.
    pub fn get_fresh(&self, key: &str) -> Option<ApiResponse> {
        let path = self.path_for(key);
        if !self.is_fresh(&path) {
            return None;
        }
        self.read(&path)
    }

    /// Returns the stored response regardless of its age.
    pub fn get_stale(&self, key: &str) -> Option<ApiResponse> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        self.read(&path)
    }

    fn read(&self, path: &Path) -> Option<ApiResponse> {
        let result = fs::read_to_string(path)
            .map_err(AppError::from)
            .and_then(|raw| {
                serde_json::from_str::<ApiResponse>(&raw).map_err(|e| AppError::Cache(format!("corrupt entry: {}", e)))
            });
        match result {
            Ok(response) => {
                debug!("Read cache entry {:?}", path);
                Some(response)
            }
            Err(e) => {
                error!("Error reading cache {:?}: {}", path, e);
                None
            }
        }
    }

    /// Writes a response, replacing any previous entry for the key.
    pub fn put(&self, key: &str, response: &ApiResponse) -> Result<PathBuf, AppError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        let body = serde_json::to_string_pretty(response)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        info!("Cached {} response to {:?}", response.endpoint, path);
        Ok(path)
    }

    /// Removes cache entries, all of them or only one endpoint's.
    ///
    /// Interrupted writes (`.json.tmp`) are always removed. A scoped clear
    /// also drops entries that no longer parse, since their endpoint is
    /// unknown. Returns the number of files deleted.
    pub fn clear(&self, endpoint: Option<Endpoint>) -> Result<usize, AppError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.ends_with(".json.tmp") {
                debug!("Removing leftover cache write {:?}", path);
                fs::remove_file(&path)?;
                removed += 1;
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(wanted) = endpoint {
                match self.read(&path) {
                    Some(stored) if stored.endpoint != wanted => continue,
                    Some(_) => {}
                    None => debug!("Removing unreadable cache entry {:?}", path),
                }
            }
            fs::remove_file(&path)?;
            removed += 1;
        }

        match endpoint {
            Some(e) => info!("Cleared {} cache files for {}", removed, e),
            None => info!("Cleared all {} cache files", removed),
        }
        Ok(removed)
    }
}
