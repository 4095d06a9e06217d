//! `frames` table rows.

use serde::Serialize;
use sqlx::FromRow;

use cassandra_core::artifact::{ArtifactLocation, ArtifactRecord, ResolutionClass};
use cassandra_core::types::Timestamp;

use crate::error::StoreError;

/// A row from the `frames` table, with `key` exposed as `remote_path`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FrameRow {
    pub station: String,
    pub resolution: String,
    pub timestamp: Timestamp,
    /// Remote path or object key of the artifact.
    pub remote_path: String,
}

impl FrameRow {
    /// Convert into the shared record shape. The filename is the last
    /// component of the key.
    pub fn into_record(self) -> Result<ArtifactRecord, StoreError> {
        let resolution_class = ResolutionClass::from_str(&self.resolution).ok_or_else(|| {
            StoreError::UnknownResolution {
                resolution: self.resolution.clone(),
                key: self.remote_path.clone(),
            }
        })?;

        let original_filename = self
            .remote_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.remote_path)
            .to_string();

        Ok(ArtifactRecord {
            station: self.station,
            resolution_class,
            timestamp: self.timestamp,
            location: ArtifactLocation::RemotePath(self.remote_path),
            original_filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn row(resolution: &str, key: &str) -> FrameRow {
        FrameRow {
            station: "ExperimentalG4".into(),
            resolution: resolution.into(),
            timestamp: Utc.with_ymd_and_hms(2020, 4, 18, 15, 0, 40).unwrap(),
            remote_path: key.into(),
        }
    }

    #[test]
    fn row_maps_to_remote_record() {
        let record = row("HiRes", "C:/htdocs/VLF/HiRes/ExperimentalG4_HiRest_180420UTC150040.jpg")
            .into_record()
            .unwrap();
        assert_eq!(record.resolution_class, ResolutionClass::HighRes);
        assert_eq!(record.original_filename, "ExperimentalG4_HiRest_180420UTC150040.jpg");
        assert!(record.remote_path().is_some());
    }

    #[test]
    fn object_key_without_directories() {
        let record = row("Wav", "clip.wav").into_record().unwrap();
        assert_eq!(record.original_filename, "clip.wav");
        assert_eq!(record.resolution_class, ResolutionClass::Audio);
    }

    #[test]
    fn backslash_keys_use_last_component() {
        let record = row("LoRes", r"C:\htdocs\VLF\LoRes\a.jpg").into_record().unwrap();
        assert_eq!(record.original_filename, "a.jpg");
    }

    #[test]
    fn unknown_resolution_is_rejected() {
        assert_matches!(
            row("MidRes", "x.jpg").into_record(),
            Err(StoreError::UnknownResolution { .. })
        );
    }
}
