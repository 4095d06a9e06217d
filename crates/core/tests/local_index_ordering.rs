//! Indexing a local station folder and normalizing the result yields
//! collections ordered by timestamp with unique filenames.

use std::fs;

use cassandra_core::artifact::{normalize_collection, ResolutionClass};
use cassandra_core::indexer::index_local_images;
use cassandra_core::timeline::{hours_on, select_half_open};

const NAMES: &[&str] = &[
    "ExperimentalG4_HiRest_180420UTC150040.jpg",
    "ExperimentalG4_HiRest_180420UTC145920.jpg",
    "ExperimentalG4_HiRest_180420UTC150000.jpg",
    "ExperimentalG4_HiRest_170420UTC235959.jpg",
    "ExperimentalG4_HiRest_bad.jpg",
];

#[test]
fn normalized_local_collection_is_time_ordered() {
    let tmp = tempfile::tempdir().unwrap();
    for name in NAMES {
        fs::write(tmp.path().join(name), b"jpeg").unwrap();
    }

    let report = index_local_images(tmp.path()).unwrap();
    assert_eq!(report.unparseable, 1);

    let records = normalize_collection(report.records);
    assert_eq!(records.len(), 4);
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(records
        .iter()
        .all(|r| r.resolution_class == ResolutionClass::HighRes));

    let day = records[1].timestamp.date_naive();
    let hours = hours_on(&records, day);
    assert_eq!(hours.len(), 2);

    let in_hour = select_half_open(&records, hours[1], hours[1] + chrono::TimeDelta::hours(1));
    assert_eq!(in_hour.len(), 2);
    assert_eq!(in_hour[0].original_filename, "ExperimentalG4_HiRest_180420UTC150000.jpg");
}
