//! Recursive one-way copy of a remote station folder to local disk.
//!
//! Files are downloaded only when missing locally or when the remote copy
//! is newer than the local one. Nothing is ever written back.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cassandra_core::types::Timestamp;

use crate::error::RemoteError;
use crate::session::RemoteEntry;

/// Directory-level access needed by [`mirror_directory`].
#[async_trait]
pub trait RemoteTree: Send + Sync {
    async fn list_entries(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError>;
    async fn fetch_bytes(&self, remote_path: &str) -> Result<Vec<u8>, RemoteError>;
}

/// Counts from one mirror run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Whether a remote file should replace (or create) the local copy.
pub fn needs_download(remote: &RemoteEntry, local_modified: Option<Timestamp>) -> bool {
    match (local_modified, remote.modified) {
        (None, _) => true,
        (Some(local), Some(remote)) => remote > local,
        (Some(_), None) => false,
    }
}

/// Mirror `remote_dir` into `local_dir`, recursing into sub-directories.
///
/// Listing failures abort the run. A single file that cannot be fetched
/// is logged and counted in [`MirrorReport::failed`].
pub async fn mirror_directory(
    tree: &dyn RemoteTree,
    remote_dir: &str,
    local_dir: &Path,
) -> Result<MirrorReport, RemoteError> {
    let mut report = MirrorReport::default();
    let mut pending: Vec<(String, PathBuf)> = vec![(remote_dir.to_string(), local_dir.to_path_buf())];

    while let Some((dir, local)) = pending.pop() {
        tokio::fs::create_dir_all(&local)
            .await
            .map_err(|e| RemoteError::Local {
                path: local.clone(),
                source: e,
            })?;

        for entry in tree.list_entries(&dir).await? {
            let remote_path = format!("{dir}/{}", entry.filename);
            let local_path = local.join(&entry.filename);

            if entry.is_dir {
                pending.push((remote_path, local_path));
                continue;
            }

            if !needs_download(&entry, local_modified(&local_path).await) {
                report.skipped += 1;
                continue;
            }

            let bytes = match tree.fetch_bytes(&remote_path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %remote_path, error = %e, "Skipping file that failed to download");
                    report.failed += 1;
                    continue;
                }
            };

            tokio::fs::write(&local_path, &bytes)
                .await
                .map_err(|e| RemoteError::Local {
                    path: local_path.clone(),
                    source: e,
                })?;
            tracing::debug!(remote = %remote_path, local = %local_path.display(), bytes = bytes.len(), "Downloaded");
            report.downloaded += 1;
        }
    }

    tracing::info!(
        remote_dir,
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed,
        "Mirror complete",
    );
    Ok(report)
}

async fn local_modified(path: &Path) -> Option<Timestamp> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(mtime: Option<Timestamp>) -> RemoteEntry {
        RemoteEntry {
            filename: "a.jpg".into(),
            modified: mtime,
            size: None,
            is_dir: false,
        }
    }

    #[test]
    fn download_decision() {
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

        assert!(needs_download(&entry(Some(old)), None));
        assert!(needs_download(&entry(Some(new)), Some(old)));
        assert!(!needs_download(&entry(Some(old)), Some(new)));
        assert!(!needs_download(&entry(Some(old)), Some(old)));
        assert!(!needs_download(&entry(None), Some(old)));
    }
}
