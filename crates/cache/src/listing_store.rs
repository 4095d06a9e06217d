//! Persisted month listings and atomic file writes.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use cassandra_core::artifact::ArtifactRecord;
use cassandra_core::types::Timestamp;

use crate::error::CacheError;

/// The stored listing of one (station, month) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthListing {
    pub station: String,
    /// `YYYY-MM`.
    pub month: String,
    pub fetched_at: Timestamp,
    /// LowRes and HighRes records, ascending by timestamp.
    pub records: Vec<ArtifactRecord>,
}

impl MonthListing {
    /// Fresh while `now - fetched_at` does not exceed `ttl`.
    pub fn is_fresh(&self, now: Timestamp, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.fetched_at) <= ttl
    }
}

/// Read a persisted listing. A missing file is `Ok(None)`.
pub async fn read_listing(path: &Path) -> Result<Option<MonthListing>, CacheError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| CacheError::corrupt(path, e))
}

/// Replace the listing at `path` atomically.
pub async fn write_listing(path: &Path, listing: &MonthListing) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec_pretty(listing).map_err(|e| CacheError::corrupt(path, e))?;
    write_atomic(path, &bytes).await
}

/// Write `bytes` to a sibling temp file, then rename it over `path`, so a
/// reader sees either the old content or the new content, never a mix.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let dir = path
        .parent()
        .ok_or_else(|| CacheError::corrupt(path, "path has no parent directory"))?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CacheError::io(dir, e))?;

    let tmp = temp_sibling(path);
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CacheError::io(&tmp, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CacheError::io(path, e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp-{}", uuid::Uuid::new_v4()))
}
