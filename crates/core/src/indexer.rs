//! Local directory indexer.
//!
//! Used when a station has no remote source configured: the station's
//! output has been copied to a local folder with `LoRes/`, `HiRes/` and
//! `Wav/` sub-directories.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::artifact::{ArtifactLocation, ArtifactRecord, ResolutionClass};
use crate::error::CoreError;
use crate::parser::parse_filename;

/// Result of scanning one directory.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// Records in filesystem enumeration order.
    pub records: Vec<ArtifactRecord>,
    /// `.jpg` entries whose name did not parse.
    pub unparseable: usize,
    /// Entries skipped for having another extension (or being directories).
    pub ignored: usize,
}

/// Index every `*.jpg` in `dir` that the filename parser accepts.
///
/// Unparseable names are counted and skipped. Results keep enumeration
/// order; callers sort when order matters.
pub fn index_local_images(dir: &Path) -> Result<IndexReport, CoreError> {
    let mut report = IndexReport::default();

    for entry in fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))? {
        let entry = entry.map_err(|e| CoreError::io(dir, e))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            report.ignored += 1;
            continue;
        };

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file || !ResolutionClass::LowRes.matches_extension(name) {
            report.ignored += 1;
            continue;
        }

        match parse_filename(name) {
            Some(parsed) => report.records.push(ArtifactRecord {
                station: parsed.station,
                resolution_class: parsed.resolution_class,
                timestamp: parsed.timestamp,
                location: ArtifactLocation::FullPath(entry.path()),
                original_filename: parsed.original_filename,
            }),
            None => {
                tracing::debug!(file = name, "Skipping unparseable frame name");
                report.unparseable += 1;
            }
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        indexed = report.records.len(),
        unparseable = report.unparseable,
        ignored = report.ignored,
        "Indexed local images",
    );

    Ok(report)
}

/// Index every `*.wav` in `dir` whose name contains `station`.
///
/// Clip names carry no parseable timestamp, so the file's modification
/// time is used instead.
pub fn index_local_audio(dir: &Path, station: &str) -> Result<Vec<ArtifactRecord>, CoreError> {
    let mut records = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))? {
        let entry = entry.map_err(|e| CoreError::io(dir, e))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !ResolutionClass::Audio.matches_extension(name) || !name.contains(station) {
            continue;
        }

        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| CoreError::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(|e| CoreError::io(&path, e))?;

        records.push(ArtifactRecord {
            station: station.to_string(),
            resolution_class: ResolutionClass::Audio,
            timestamp: DateTime::<Utc>::from(modified),
            location: ArtifactLocation::FullPath(path),
            original_filename: name.to_string(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"\xFF\xD8data\xFF\xD9").unwrap();
    }

    #[test]
    fn indexes_parseable_jpgs_only() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "ExperimentalG4_LoRest_180420UTC0100.jpg");
        touch(tmp.path(), "ExperimentalG4_LoRest_180420UTC0200.jpg");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "garbage.jpg");
        fs::create_dir(tmp.path().join("sub.jpg")).unwrap();

        let report = index_local_images(tmp.path()).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.unparseable, 1);
        assert_eq!(report.ignored, 2);
        for r in &report.records {
            assert_eq!(r.station, "ExperimentalG4");
            assert!(r.full_path().unwrap().starts_with(tmp.path()));
            assert!(r.remote_path().is_none());
        }
    }

    #[test]
    fn missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = index_local_images(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }

    #[test]
    fn audio_filtered_by_station_substring() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "ExperimentalG4_20200418_0100.wav");
        touch(tmp.path(), "Duronia_20200418_0100.wav");
        touch(tmp.path(), "ExperimentalG4_20200418_0100.mp3");

        let clips = index_local_audio(tmp.path(), "ExperimentalG4").unwrap();

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].resolution_class, ResolutionClass::Audio);
        assert_eq!(clips[0].original_filename, "ExperimentalG4_20200418_0100.wav");
    }
}
