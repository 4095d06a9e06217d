//! Mapping remote directory entries to artifact records.

use chrono::{DateTime, Utc};

use cassandra_core::artifact::{
    normalize_collection, ArtifactLocation, ArtifactRecord, ResolutionClass, UNKNOWN_STATION,
};
use cassandra_core::parser::parse_filename;

use crate::session::RemoteEntry;

/// Turn the entries of `<remote_base>/<class>` into records.
///
/// Names that parse supply station and timestamp. Anything else is kept
/// with the [`UNKNOWN_STATION`] marker and the entry's modification time:
/// a remote listing is expensive to repeat, so nothing with the right
/// extension is dropped. The result is sorted by timestamp and unique by
/// filename.
pub fn entries_to_records(
    entries: &[RemoteEntry],
    class: ResolutionClass,
    remote_dir: &str,
) -> Vec<ArtifactRecord> {
    let mut fallbacks = 0usize;

    let records = entries
        .iter()
        .filter(|e| !e.is_dir && class.matches_extension(&e.filename))
        .map(|entry| {
            let (station, timestamp) = match parse_filename(&entry.filename) {
                Some(parsed) => (parsed.station, parsed.timestamp),
                None => {
                    fallbacks += 1;
                    (
                        UNKNOWN_STATION.to_string(),
                        entry.modified.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                    )
                }
            };
            ArtifactRecord {
                station,
                resolution_class: class,
                timestamp,
                location: ArtifactLocation::RemotePath(format!("{remote_dir}/{}", entry.filename)),
                original_filename: entry.filename.clone(),
            }
        })
        .collect::<Vec<_>>();

    if fallbacks > 0 {
        tracing::debug!(
            dir = remote_dir,
            fallbacks,
            "Used modification time for unparseable remote names",
        );
    }

    normalize_collection(records)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(name: &str, mtime_hour: Option<u32>) -> RemoteEntry {
        RemoteEntry {
            filename: name.into(),
            modified: mtime_hour.map(|h| Utc.with_ymd_and_hms(2021, 3, 1, h, 0, 0).unwrap()),
            size: Some(1024),
            is_dir: false,
        }
    }

    #[test]
    fn parsed_names_keep_embedded_fields() {
        let entries = vec![
            entry("ExperimentalG4_LoRest_180420UTC0200.jpg", Some(9)),
            entry("ExperimentalG4_LoRest_180420UTC0100.jpg", Some(9)),
        ];
        let records = entries_to_records(&entries, ResolutionClass::LowRes, "C:/htdocs/VLF/LoRes");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].original_filename, "ExperimentalG4_LoRest_180420UTC0100.jpg");
        assert_eq!(records[0].station, "ExperimentalG4");
        assert_eq!(
            records[0].remote_path(),
            Some("C:/htdocs/VLF/LoRes/ExperimentalG4_LoRest_180420UTC0100.jpg")
        );
        assert_eq!(records[0].timestamp, Utc.with_ymd_and_hms(2020, 4, 18, 1, 0, 0).unwrap());
    }

    #[test]
    fn unparseable_names_fall_back_to_mtime() {
        let entries = vec![entry("snapshot.JPG", Some(7))];
        let records = entries_to_records(&entries, ResolutionClass::HighRes, "/vlf/HiRes");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].station, UNKNOWN_STATION);
        assert_eq!(records[0].resolution_class, ResolutionClass::HighRes);
        assert_eq!(records[0].timestamp, Utc.with_ymd_and_hms(2021, 3, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn missing_mtime_still_keeps_entry() {
        let records = entries_to_records(&[entry("x.jpg", None)], ResolutionClass::LowRes, "/d");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn filters_directories_and_other_extensions() {
        let mut dir = entry("nested.jpg", Some(1));
        dir.is_dir = true;
        let entries = vec![dir, entry("readme.txt", Some(1)), entry("clip.wav", Some(3))];

        assert!(entries_to_records(&entries, ResolutionClass::LowRes, "/d").is_empty());

        let audio = entries_to_records(&entries, ResolutionClass::Audio, "/d/Wav");
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].remote_path(), Some("/d/Wav/clip.wav"));
    }
}
