//! Bucket keys and the on-disk layout of the cache root.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, TimeZone, Utc};

use cassandra_core::types::Timestamp;

/// Thumbnail subdirectory inside a bucket.
pub const THUMBS_DIR: &str = "thumbs";

/// A calendar month in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Returns `None` when `month` is not in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_timestamp(ts: Timestamp) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let (year, month) = s.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    /// First instant of the month.
    pub fn start(&self) -> Option<Timestamp> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
    }

    /// Whether `ts` falls in this month (UTC).
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts.year() == self.year && ts.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Whether `name` can be used as a single path component under the cache.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Paths under one cache root.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<station>/<YYYY-MM>`
    pub fn bucket_dir(&self, station: &str, month: MonthKey) -> PathBuf {
        self.root.join(station).join(month.to_string())
    }

    /// `<root>/<station>/<YYYY-MM>/meta_<YYYY-MM>.json`
    pub fn listing_path(&self, station: &str, month: MonthKey) -> PathBuf {
        self.bucket_dir(station, month)
            .join(format!("meta_{month}.json"))
    }

    pub fn thumbs_dir(&self, station: &str, month: MonthKey) -> PathBuf {
        self.bucket_dir(station, month).join(THUMBS_DIR)
    }

    /// Thumbnail path, or `None` if either key is not a safe path component.
    pub fn thumbnail_path(&self, station: &str, month: MonthKey, filename: &str) -> Option<PathBuf> {
        if !is_safe_component(station) || !is_safe_component(filename) {
            return None;
        }
        Some(self.thumbs_dir(station, month).join(filename))
    }
}
