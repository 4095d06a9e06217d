//! Artifact data model.
//!
//! An [`ArtifactRecord`] describes one physical file produced by a
//! station: a LowRes or HighRes spectrogram frame, or an audio clip.
//! Records are produced by the local indexer, the remote listing client
//! and the centralized metadata store, and all three agree on this shape.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{StationId, Timestamp};

/// Station marker used when an entry's name cannot be parsed.
pub const UNKNOWN_STATION: &str = "UNKNOWN";

// ---------------------------------------------------------------------------
// Resolution class
// ---------------------------------------------------------------------------

/// The three logical collections a station produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionClass {
    /// Hourly spectrogram frames.
    LowRes,
    /// Near-continuous spectrogram frames.
    HighRes,
    /// Raw waveform clips.
    Audio,
}

impl ResolutionClass {
    /// All classes, in display order.
    pub const ALL: [ResolutionClass; 3] = [Self::LowRes, Self::HighRes, Self::Audio];

    /// Image classes only.
    pub const IMAGES: [ResolutionClass; 2] = [Self::LowRes, Self::HighRes];

    /// Name used for the station directory and the store's `resolution` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowRes => "LoRes",
            Self::HighRes => "HiRes",
            Self::Audio => "Wav",
        }
    }

    /// Parse a directory / column name. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LoRes" => Some(Self::LowRes),
            "HiRes" => Some(Self::HighRes),
            "Wav" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Lowercase file extension (without the dot) for this class.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::LowRes | Self::HighRes => "jpg",
            Self::Audio => "wav",
        }
    }

    /// Case-insensitive extension check used when enumerating directories.
    pub fn matches_extension(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension()))
    }
}

impl std::fmt::Display for ResolutionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Where the bytes of an artifact live. Local and remote are exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactLocation {
    FullPath(PathBuf),
    RemotePath(String),
}

/// One physical artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub station: StationId,
    pub resolution_class: ResolutionClass,
    pub timestamp: Timestamp,
    pub location: ArtifactLocation,
    pub original_filename: String,
}

impl ArtifactRecord {
    /// Remote path, if this record came from a remote source.
    pub fn remote_path(&self) -> Option<&str> {
        match &self.location {
            ArtifactLocation::RemotePath(p) => Some(p),
            ArtifactLocation::FullPath(_) => None,
        }
    }

    /// Local path, if this record came from the local indexer.
    pub fn full_path(&self) -> Option<&Path> {
        match &self.location {
            ArtifactLocation::FullPath(p) => Some(p),
            ArtifactLocation::RemotePath(_) => None,
        }
    }
}

/// Sort a collection ascending by timestamp (ties broken by filename) and
/// drop later duplicates of the same `original_filename`.
pub fn normalize_collection(mut records: Vec<ArtifactRecord>) -> Vec<ArtifactRecord> {
    records.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.original_filename.cmp(&b.original_filename))
    });

    let mut seen = HashSet::with_capacity(records.len());
    records.retain(|r| seen.insert(r.original_filename.clone()));
    records
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Successful result of a listing boundary: data, or a legitimate absence
/// of data. Failures travel separately in the `Err` arm of a `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Found(T),
    Empty,
}

impl Outcome<Vec<ArtifactRecord>> {
    /// `Empty` for an empty collection, `Found` otherwise.
    pub fn from_records(records: Vec<ArtifactRecord>) -> Self {
        if records.is_empty() {
            Self::Empty
        } else {
            Self::Found(records)
        }
    }

    /// Collapse back into a (possibly empty) collection.
    pub fn into_records(self) -> Vec<ArtifactRecord> {
        match self {
            Self::Found(records) => records,
            Self::Empty => Vec::new(),
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(name: &str, hour: u32) -> ArtifactRecord {
        ArtifactRecord {
            station: "ExperimentalG4".into(),
            resolution_class: ResolutionClass::LowRes,
            timestamp: Utc.with_ymd_and_hms(2020, 4, 18, hour, 0, 0).unwrap(),
            location: ArtifactLocation::RemotePath(format!("C:/htdocs/VLF/LoRes/{name}")),
            original_filename: name.into(),
        }
    }

    #[test]
    fn class_names_round_trip() {
        for class in ResolutionClass::ALL {
            assert_eq!(ResolutionClass::from_str(class.as_str()), Some(class));
        }
        assert_eq!(ResolutionClass::from_str("lores"), None);
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(ResolutionClass::LowRes.matches_extension("a.JPG"));
        assert!(ResolutionClass::Audio.matches_extension("clip.wav"));
        assert!(!ResolutionClass::HighRes.matches_extension("clip.wav"));
        assert!(!ResolutionClass::HighRes.matches_extension("noext"));
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let out = normalize_collection(vec![
            record("c.jpg", 3),
            record("a.jpg", 1),
            record("c.jpg", 5),
            record("b.jpg", 1),
        ]);
        let names: Vec<_> = out.iter().map(|r| r.original_filename.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(out[2].timestamp.format("%H").to_string(), "03");
    }

    #[test]
    fn location_serializes_with_path_kind() {
        let json = serde_json::to_value(record("a.jpg", 1)).unwrap();
        assert_eq!(json["location"]["remote_path"], "C:/htdocs/VLF/LoRes/a.jpg");
        assert_eq!(json["resolution_class"], "LowRes");
    }

    #[test]
    fn outcome_from_empty_records() {
        assert!(Outcome::from_records(Vec::new()).is_empty());
        let found = Outcome::from_records(vec![record("a.jpg", 1)]);
        assert_eq!(found.into_records().len(), 1);
    }
}
