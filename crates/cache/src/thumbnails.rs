//! Thumbnail population and lookup.
//!
//! A thumbnail is the first `max_bytes` of an image artifact, stored under
//! the bucket's `thumbs/` directory by original filename. Thumbnails are
//! written once and never re-fetched.

use std::path::PathBuf;

use futures::stream::{self, StreamExt};

use cassandra_core::artifact::ArtifactRecord;
use cassandra_remote::ArtifactSource;

use crate::bucket::{CacheLayout, MonthKey};
use crate::error::CacheError;
use crate::listing_store::write_atomic;

/// Counts from one population pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub fetched: usize,
    pub already_cached: usize,
    pub failed: usize,
}

/// A thumbnail that still has to be fetched.
struct Pending {
    filename: String,
    remote_path: String,
    target: PathBuf,
}

/// Fetch the thumbnails missing for `records` with at most `workers`
/// requests in flight. A failed fetch or write is logged and counted; the
/// rest of the batch carries on.
pub async fn populate_missing(
    source: &dyn ArtifactSource,
    layout: &CacheLayout,
    station: &str,
    month: MonthKey,
    records: &[ArtifactRecord],
    max_bytes: usize,
    workers: usize,
) -> PopulateReport {
    let mut report = PopulateReport::default();
    let mut pending = Vec::new();

    for record in records {
        let Some(remote_path) = record.remote_path() else {
            continue;
        };
        let Some(target) = layout.thumbnail_path(station, month, &record.original_filename) else {
            tracing::warn!(
                station,
                filename = %record.original_filename,
                "Skipping thumbnail with unsafe filename",
            );
            report.failed += 1;
            continue;
        };
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            report.already_cached += 1;
            continue;
        }
        pending.push(Pending {
            filename: record.original_filename.clone(),
            remote_path: remote_path.to_string(),
            target,
        });
    }

    if pending.is_empty() {
        return report;
    }

    let results: Vec<(String, Result<usize, String>)> = stream::iter(pending)
        .map(|job| async move {
            let outcome = fetch_one(source, &job, max_bytes).await;
            (job.filename, outcome)
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    for (filename, outcome) in results {
        match outcome {
            Ok(bytes) => {
                tracing::debug!(station, filename = %filename, bytes, "Cached thumbnail");
                report.fetched += 1;
            }
            Err(e) => {
                tracing::warn!(station, filename = %filename, error = %e, "Thumbnail fetch failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        station,
        month = %month,
        fetched = report.fetched,
        already_cached = report.already_cached,
        failed = report.failed,
        "Thumbnail population complete",
    );
    report
}

async fn fetch_one(
    source: &dyn ArtifactSource,
    job: &Pending,
    max_bytes: usize,
) -> Result<usize, String> {
    let mut bytes = source
        .fetch_bytes(&job.remote_path)
        .await
        .map_err(|e| e.to_string())?;
    bytes.truncate(max_bytes);
    write_atomic(&job.target, &bytes)
        .await
        .map_err(|e| e.to_string())?;
    Ok(bytes.len())
}

/// Cached thumbnail bytes, or `None` when absent. Purely local.
pub async fn read_thumbnail(
    layout: &CacheLayout,
    station: &str,
    month: MonthKey,
    filename: &str,
) -> Result<Option<Vec<u8>>, CacheError> {
    let Some(path) = layout.thumbnail_path(station, month, filename) else {
        return Ok(None);
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(&path, e)),
    }
}
