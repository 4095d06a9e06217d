//! Station artifact filename parser.
//!
//! Frames are named `<station>_<LoRes|HiRes>t_<ddmmyy>UTC<HHMM[SS]>.jpg`,
//! for example `ExperimentalG4_HiRest_180420UTC150040.jpg`. Anything that
//! does not follow the grammar is a non-match, never an error, so batch
//! indexing can skip bad entries without aborting.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::artifact::ResolutionClass;
use crate::types::Timestamp;

/// Capture groups: station, class token, day, month, two-digit year, time.
const FILENAME_PATTERN: &str =
    r"^([A-Za-z0-9]+)_(LoRes|HiRes)t_(\d{2})(\d{2})(\d{2})UTC(\d{4}|\d{6})\.jpg$";

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FILENAME_PATTERN).expect("valid regex"));

/// Two-digit years are assumed to fall in this century.
const CENTURY: i32 = 2000;

/// Structured fields decoded from a frame filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub station: String,
    pub resolution_class: ResolutionClass,
    pub timestamp: Timestamp,
    /// Base name the fields were decoded from.
    pub original_filename: String,
}

/// Parse a frame filename. Directory components are ignored.
///
/// Returns `None` when the name does not follow the grammar or encodes an
/// impossible date or time (e.g. 31 April).
///
/// ```
/// use cassandra_core::artifact::ResolutionClass;
/// use cassandra_core::parser::parse_filename;
///
/// let parsed = parse_filename("ExperimentalG4_LoRest_180420UTC0100.jpg").unwrap();
/// assert_eq!(parsed.station, "ExperimentalG4");
/// assert_eq!(parsed.resolution_class, ResolutionClass::LowRes);
/// assert!(parse_filename("foo_bar.jpg").is_none());
/// ```
pub fn parse_filename(name: &str) -> Option<ParsedName> {
    let base = Path::new(name).file_name()?.to_str()?;
    let caps = FILENAME_RE.captures(base)?;

    let resolution_class = match &caps[2] {
        "LoRes" => ResolutionClass::LowRes,
        "HiRes" => ResolutionClass::HighRes,
        _ => return None,
    };

    let day: u32 = caps[3].parse().ok()?;
    let month: u32 = caps[4].parse().ok()?;
    let year = CENTURY + caps[5].parse::<i32>().ok()?;

    let time = &caps[6];
    let hour: u32 = time[0..2].parse().ok()?;
    let minute: u32 = time[2..4].parse().ok()?;
    let second: u32 = if time.len() == 6 {
        time[4..6].parse().ok()?
    } else {
        0
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    Some(ParsedName {
        station: caps[1].to_string(),
        resolution_class,
        timestamp: Utc.from_utc_datetime(&naive),
        original_filename: base.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn hires_with_seconds() {
        let p = parse_filename("ExperimentalG4_HiRest_180420UTC150040.jpg").unwrap();
        assert_eq!(p.station, "ExperimentalG4");
        assert_eq!(p.resolution_class, ResolutionClass::HighRes);
        assert_eq!(p.timestamp, Utc.with_ymd_and_hms(2020, 4, 18, 15, 0, 40).unwrap());
        assert_eq!(p.original_filename, "ExperimentalG4_HiRest_180420UTC150040.jpg");
    }

    #[test]
    fn lores_without_seconds() {
        let p = parse_filename("ExperimentalG4_LoRest_180420UTC0100.jpg").unwrap();
        assert_eq!(p.resolution_class, ResolutionClass::LowRes);
        assert_eq!(p.timestamp, Utc.with_ymd_and_hms(2020, 4, 18, 1, 0, 0).unwrap());
    }

    #[test]
    fn directory_prefix_is_ignored() {
        let p = parse_filename("VLF/LoRes/Duronia_LoRest_010121UTC2300.jpg").unwrap();
        assert_eq!(p.station, "Duronia");
        assert_eq!(p.original_filename, "Duronia_LoRest_010121UTC2300.jpg");
    }

    #[test]
    fn unrelated_name_is_no_match() {
        assert!(parse_filename("foo_bar.jpg").is_none());
        assert!(parse_filename("").is_none());
    }

    #[test]
    fn wrong_extension_is_no_match() {
        assert!(parse_filename("ExperimentalG4_LoRest_180420UTC0100.png").is_none());
        assert!(parse_filename("ExperimentalG4_LoRest_180420UTC0100.JPG").is_none());
    }

    #[test]
    fn class_token_is_case_sensitive() {
        assert!(parse_filename("ExperimentalG4_lores t_180420UTC0100.jpg").is_none());
        assert!(parse_filename("ExperimentalG4_LORESt_180420UTC0100.jpg").is_none());
    }

    #[test]
    fn missing_utc_token_is_no_match() {
        assert!(parse_filename("ExperimentalG4_LoRest_1804200100.jpg").is_none());
    }

    #[test]
    fn five_digit_time_is_no_match() {
        assert!(parse_filename("ExperimentalG4_LoRest_180420UTC01000.jpg").is_none());
    }

    #[test]
    fn impossible_calendar_date_is_no_match() {
        // April has 30 days.
        assert!(parse_filename("ExperimentalG4_LoRest_310420UTC0100.jpg").is_none());
        assert!(parse_filename("ExperimentalG4_LoRest_181320UTC0100.jpg").is_none());
    }

    #[test]
    fn impossible_time_is_no_match() {
        assert!(parse_filename("ExperimentalG4_HiRest_180420UTC2500.jpg").is_none());
        assert!(parse_filename("ExperimentalG4_HiRest_180420UTC120099.jpg").is_none());
    }

    #[test]
    fn leap_day_parses() {
        let p = parse_filename("ExperimentalG4_LoRest_290224UTC1200.jpg").unwrap();
        assert_eq!(p.timestamp, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
    }
}
