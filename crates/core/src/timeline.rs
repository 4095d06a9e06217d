//! Time-window helpers used when browsing a station's output.
//!
//! All functions take collections that are already sorted ascending by
//! timestamp (every source guarantees this) and never reorder them.

use std::collections::BTreeSet;

use chrono::{DurationRound, NaiveDate, NaiveTime, TimeDelta};

use crate::artifact::ArtifactRecord;
use crate::types::Timestamp;

/// Anything positioned on the timeline.
pub trait Timestamped {
    fn timestamp(&self) -> Timestamp;
}

impl Timestamped for ArtifactRecord {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl Timestamped for Timestamp {
    fn timestamp(&self) -> Timestamp {
        *self
    }
}

/// Evenly spaced instants from `start` to `end`, both inclusive when `end`
/// lands on a step. Empty when `end < start` or `step` is not positive.
pub fn generate_timeline(start: Timestamp, end: Timestamp, step: TimeDelta) -> Vec<Timestamp> {
    if end < start || step <= TimeDelta::zero() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut current = start;
    while current <= end {
        out.push(current);
        current += step;
    }
    out
}

/// The item nearest to `target`; the earliest wins a tie.
pub fn closest_match<T: Timestamped>(items: &[T], target: Timestamp) -> Option<&T> {
    items
        .iter()
        .min_by_key(|item| (item.timestamp() - target).abs())
}

/// Truncate to the start of the hour.
pub fn truncate_to_hour(ts: Timestamp) -> Timestamp {
    ts.duration_trunc(TimeDelta::hours(1)).unwrap_or(ts)
}

/// Items with `start <= t <= end`.
pub fn select_inclusive<T: Timestamped + Clone>(
    items: &[T],
    start: Timestamp,
    end: Timestamp,
) -> Vec<T> {
    items
        .iter()
        .filter(|i| (start..=end).contains(&i.timestamp()))
        .cloned()
        .collect()
}

/// Items with `start <= t < end`.
pub fn select_half_open<T: Timestamped + Clone>(
    items: &[T],
    start: Timestamp,
    end: Timestamp,
) -> Vec<T> {
    items
        .iter()
        .filter(|i| (start..end).contains(&i.timestamp()))
        .cloned()
        .collect()
}

/// Distinct calendar dates (UTC) present in a collection, ascending.
pub fn available_dates<T: Timestamped>(items: &[T]) -> Vec<NaiveDate> {
    items
        .iter()
        .map(|i| i.timestamp().date_naive())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct times of day present on `date`, ascending.
pub fn times_on<T: Timestamped>(items: &[T], date: NaiveDate) -> Vec<NaiveTime> {
    items
        .iter()
        .map(Timestamped::timestamp)
        .filter(|ts| ts.date_naive() == date)
        .map(|ts| ts.time())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct whole hours present on `date`, ascending.
pub fn hours_on<T: Timestamped>(items: &[T], date: NaiveDate) -> Vec<Timestamp> {
    items
        .iter()
        .map(Timestamped::timestamp)
        .filter(|ts| ts.date_naive() == date)
        .map(truncate_to_hour)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2023, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn timeline_five_minute_steps() {
        let tl = generate_timeline(at(0, 0), at(0, 20), TimeDelta::minutes(5));
        assert_eq!(tl, vec![at(0, 0), at(0, 5), at(0, 10), at(0, 15), at(0, 20)]);
    }

    #[test]
    fn timeline_empty_when_end_before_start() {
        assert!(generate_timeline(at(1, 0), at(0, 0), TimeDelta::minutes(5)).is_empty());
    }

    #[test]
    fn timeline_single_point() {
        assert_eq!(generate_timeline(at(1, 0), at(1, 0), TimeDelta::minutes(5)), vec![at(1, 0)]);
    }

    #[test]
    fn timeline_rejects_non_positive_step() {
        assert!(generate_timeline(at(0, 0), at(1, 0), TimeDelta::zero()).is_empty());
    }

    #[test]
    fn closest_picks_nearest() {
        let items = vec![at(11, 57), at(12, 10)];
        assert_eq!(closest_match(&items, at(12, 5)), Some(&at(12, 10)));
        assert_eq!(closest_match(&items, at(11, 0)), Some(&at(11, 57)));
    }

    #[test]
    fn closest_on_empty_is_none() {
        let items: Vec<Timestamp> = Vec::new();
        assert!(closest_match(&items, at(0, 0)).is_none());
    }

    #[test]
    fn closest_tie_prefers_earlier() {
        let items = vec![at(12, 0), at(12, 10)];
        assert_eq!(closest_match(&items, at(12, 5)), Some(&at(12, 0)));
    }

    #[test]
    fn window_bounds() {
        let items = vec![at(1, 0), at(1, 30), at(2, 0)];
        assert_eq!(select_inclusive(&items, at(1, 0), at(2, 0)).len(), 3);
        assert_eq!(select_half_open(&items, at(1, 0), at(2, 0)), vec![at(1, 0), at(1, 30)]);
    }

    #[test]
    fn dates_times_and_hours() {
        let other_day = Utc.with_ymd_and_hms(2023, 1, 2, 5, 0, 0).unwrap();
        let items = vec![at(1, 0), at(1, 40), at(3, 15), other_day];
        let day = at(0, 0).date_naive();

        assert_eq!(available_dates(&items), vec![day, other_day.date_naive()]);
        assert_eq!(times_on(&items, day).len(), 3);
        assert_eq!(hours_on(&items, day), vec![at(1, 0), at(3, 0)]);
        assert_eq!(truncate_to_hour(at(3, 15)), at(3, 0));
    }
}
