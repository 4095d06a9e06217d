//! Explicit viewer state threaded through each interaction.
//!
//! The presentation layer re-runs its control flow on every interaction;
//! everything it must remember between runs lives in [`ViewState`], which
//! is passed in and handed back rather than kept in any ambient session.

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use cassandra_core::artifact::ArtifactRecord;
use cassandra_core::timeline::{
    available_dates, closest_match, hours_on, select_half_open, select_inclusive,
    truncate_to_hour,
};
use cassandra_core::types::Timestamp;

use crate::loader::LoadedData;

/// Slider granularity.
pub const SLIDER_STEP_MINUTES: i64 = 5;

/// Length of a new slider window and of a picked hour.
pub fn default_window() -> TimeDelta {
    TimeDelta::hours(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Free `[start, end]` window.
    #[default]
    Slider,
    /// One LowRes hour at a time, HighRes around it.
    HourPicker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourStep {
    Earlier,
    Later,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ControlMode,
    pub date: Option<NaiveDate>,
    pub window: Option<(Timestamp, Timestamp)>,
    pub lores_hour: Option<Timestamp>,
    /// HighRes range around the picked hour, in minutes (0..=60).
    pub minutes_before: u32,
    pub minutes_after: u32,
    pub logs: Vec<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ControlMode::Slider,
            date: None,
            window: None,
            lores_hour: None,
            minutes_before: 0,
            minutes_after: 60,
            logs: Vec::new(),
        }
    }
}

/// What the viewer shows for the active window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSelection {
    pub start: Timestamp,
    pub end: Timestamp,
    pub lowres: Vec<ArtifactRecord>,
    pub highres: Vec<ArtifactRecord>,
    pub clip: Option<ArtifactRecord>,
    /// Informational notes for empty sections. Not errors.
    pub messages: Vec<String>,
}

impl ViewState {
    pub fn new(mode: ControlMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Fill in the date, window and hour from the data when unset or no
    /// longer valid. Returns `false` when there is nothing to show.
    pub fn sync(&mut self, data: &LoadedData) -> bool {
        let all = data.all_timestamps();
        let dates = available_dates(&all);
        let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
            return false;
        };

        let date = match self.date {
            Some(d) if (first..=last).contains(&d) => d,
            _ => first,
        };
        if self.date != Some(date) {
            self.date = Some(date);
            self.window = None;
            self.lores_hour = None;
        }

        if self.window.is_none() {
            if let Some(start) = all.iter().copied().find(|ts| ts.date_naive() == date) {
                self.window = Some((start, start + default_window()));
            }
        }

        match self.mode {
            ControlMode::Slider => {
                self.lores_hour = self.window.map(|(start, _)| truncate_to_hour(start));
            }
            ControlMode::HourPicker => {
                let hours = self.hour_options(&data.lowres);
                if !self.lores_hour.is_some_and(|h| hours.contains(&h)) {
                    self.lores_hour = hours.first().copied();
                }
            }
        }
        true
    }

    /// Distinct LowRes hours on the selected date.
    pub fn hour_options(&self, lowres: &[ArtifactRecord]) -> Vec<Timestamp> {
        self.date
            .map(|d| hours_on(lowres, d))
            .unwrap_or_default()
    }

    /// Move the picked hour one step. Stops at either end; returns whether
    /// the hour changed.
    pub fn step_hour(&mut self, lowres: &[ArtifactRecord], step: HourStep) -> bool {
        let hours = self.hour_options(lowres);
        let Some(current) = self.lores_hour else {
            return false;
        };
        let Some(idx) = hours.iter().position(|h| *h == current) else {
            return false;
        };
        let next = match step {
            HourStep::Earlier => idx.checked_sub(1),
            HourStep::Later => Some(idx + 1).filter(|i| *i < hours.len()),
        };
        match next {
            Some(i) => {
                self.lores_hour = Some(hours[i]);
                true
            }
            None => false,
        }
    }

    /// Set the slider window to `[date + start, date + end]`, snapped
    /// down to the slider step.
    pub fn set_window(&mut self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        let start = snap(date.and_time(start).and_utc());
        let end = snap(date.and_time(end).and_utc());
        if end < start {
            return false;
        }
        self.date = Some(date);
        self.window = Some((start, end));
        self.lores_hour = Some(truncate_to_hour(start));
        true
    }

    /// The active `(start, end)` window for the current mode.
    pub fn active_window(&self) -> Option<(Timestamp, Timestamp)> {
        match self.mode {
            ControlMode::Slider => self.window,
            ControlMode::HourPicker => self.lores_hour.map(|h| (h, h + default_window())),
        }
    }

    /// Select frames and the audio clip for the active window.
    pub fn select(&self, data: &LoadedData) -> Option<WindowSelection> {
        let (start, end) = self.active_window()?;
        let selection = match self.mode {
            ControlMode::Slider => select_window(data, start, end),
            ControlMode::HourPicker => {
                let lowres: Vec<ArtifactRecord> = data
                    .lowres
                    .iter()
                    .find(|r| truncate_to_hour(r.timestamp) == start)
                    .cloned()
                    .into_iter()
                    .collect();
                let hi_start = start - TimeDelta::minutes(i64::from(self.minutes_before.min(60)));
                let hi_end = start + TimeDelta::minutes(i64::from(self.minutes_after.min(60)));
                let highres = select_half_open(&data.highres, hi_start, hi_end);
                with_messages(WindowSelection {
                    start,
                    end,
                    lowres,
                    highres,
                    clip: pick_clip(&data.audio, start, end),
                    messages: Vec::new(),
                })
            }
        };
        Some(selection)
    }
}

/// LowRes in `[start, end]`, HighRes in `[start, end)`, and the clip
/// closest to `start` within the window (else the first clip).
pub fn select_window(data: &LoadedData, start: Timestamp, end: Timestamp) -> WindowSelection {
    with_messages(WindowSelection {
        start,
        end,
        lowres: select_inclusive(&data.lowres, start, end),
        highres: select_half_open(&data.highres, start, end),
        clip: pick_clip(&data.audio, start, end),
        messages: Vec::new(),
    })
}

fn pick_clip(audio: &[ArtifactRecord], start: Timestamp, end: Timestamp) -> Option<ArtifactRecord> {
    let in_window = select_inclusive(audio, start, end);
    closest_match(&in_window, start)
        .or_else(|| audio.first())
        .cloned()
}

fn with_messages(mut selection: WindowSelection) -> WindowSelection {
    if selection.lowres.is_empty() {
        selection.messages.push("No LoRes frames in this window.".into());
    }
    if selection.highres.is_empty() {
        selection.messages.push("No HiRes frames in this interval.".into());
    }
    if selection.clip.is_none() {
        selection.messages.push("No .wav files available.".into());
    }
    selection
}

fn snap(ts: Timestamp) -> Timestamp {
    use chrono::DurationRound;
    ts.duration_trunc(TimeDelta::minutes(SLIDER_STEP_MINUTES))
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use cassandra_core::artifact::{ArtifactLocation, ResolutionClass};

    use super::*;
    use crate::loader::DataOrigin;

    fn at(day: u32, hour: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2020, 4, day, hour, min, 0).unwrap()
    }

    fn rec(class: ResolutionClass, name: &str, ts: Timestamp) -> ArtifactRecord {
        ArtifactRecord {
            station: "ExperimentalG4".into(),
            resolution_class: class,
            timestamp: ts,
            location: ArtifactLocation::FullPath(name.into()),
            original_filename: name.into(),
        }
    }

    fn data() -> LoadedData {
        LoadedData {
            lowres: vec![
                rec(ResolutionClass::LowRes, "l1", at(18, 1, 0)),
                rec(ResolutionClass::LowRes, "l2", at(18, 2, 0)),
                rec(ResolutionClass::LowRes, "l3", at(18, 3, 0)),
                rec(ResolutionClass::LowRes, "l4", at(19, 0, 0)),
            ],
            highres: vec![
                rec(ResolutionClass::HighRes, "h1", at(18, 1, 0)),
                rec(ResolutionClass::HighRes, "h2", at(18, 1, 40)),
                rec(ResolutionClass::HighRes, "h3", at(18, 2, 0)),
            ],
            audio: vec![
                rec(ResolutionClass::Audio, "w1", at(18, 1, 30)),
                rec(ResolutionClass::Audio, "w2", at(18, 1, 10)),
            ],
            is_remote: false,
            client: None,
            origin: DataOrigin::Local,
        }
    }

    fn names(records: &[ArtifactRecord]) -> Vec<&str> {
        records.iter().map(|r| r.original_filename.as_str()).collect()
    }

    #[test]
    fn slider_bounds_differ_per_class() {
        let sel = select_window(&data(), at(18, 1, 0), at(18, 2, 0));
        assert_eq!(names(&sel.lowres), vec!["l1", "l2"]);
        assert_eq!(names(&sel.highres), vec!["h1", "h2"]);
        assert_eq!(sel.clip.unwrap().original_filename, "w2");
        assert!(sel.messages.is_empty());
    }

    #[test]
    fn clip_falls_back_to_first_and_empty_window_is_informational() {
        let sel = select_window(&data(), at(20, 0, 0), at(20, 1, 0));
        assert!(sel.lowres.is_empty());
        assert!(sel.highres.is_empty());
        assert_eq!(sel.clip.unwrap().original_filename, "w1");
        assert_eq!(sel.messages.len(), 2);
    }

    #[test]
    fn sync_picks_first_date_and_default_window() {
        let mut state = ViewState::default();
        assert!(state.sync(&data()));
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2020, 4, 18));
        assert_eq!(state.window, Some((at(18, 1, 0), at(18, 2, 0))));
        assert_eq!(state.lores_hour, Some(at(18, 1, 0)));
    }

    #[test]
    fn sync_on_empty_data_reports_nothing_to_show() {
        let empty = LoadedData {
            lowres: vec![],
            highres: vec![],
            audio: vec![],
            ..data()
        };
        assert!(!ViewState::default().sync(&empty));
    }

    #[test]
    fn hour_picker_navigation_stops_at_ends() {
        let d = data();
        let mut state = ViewState::new(ControlMode::HourPicker);
        state.sync(&d);
        assert_eq!(state.hour_options(&d.lowres), vec![at(18, 1, 0), at(18, 2, 0), at(18, 3, 0)]);

        assert!(!state.step_hour(&d.lowres, HourStep::Earlier));
        assert!(state.step_hour(&d.lowres, HourStep::Later));
        assert!(state.step_hour(&d.lowres, HourStep::Later));
        assert_eq!(state.lores_hour, Some(at(18, 3, 0)));
        assert!(!state.step_hour(&d.lowres, HourStep::Later));
    }

    #[test]
    fn hour_picker_shows_one_lowres_frame_and_highres_after_it() {
        let d = data();
        let mut state = ViewState::new(ControlMode::HourPicker);
        state.sync(&d);

        let sel = state.select(&d).unwrap();
        assert_eq!((sel.start, sel.end), (at(18, 1, 0), at(18, 2, 0)));
        assert_eq!(names(&sel.lowres), vec!["l1"]);
        assert_eq!(names(&sel.highres), vec!["h1", "h2"]);

        state.minutes_after = 30;
        let sel = state.select(&d).unwrap();
        assert_eq!(names(&sel.highres), vec!["h1"]);
    }

    #[test]
    fn set_window_snaps_and_rejects_inverted_ranges() {
        let mut state = ViewState::default();
        let date = NaiveDate::from_ymd_opt(2020, 4, 18).unwrap();
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

        assert!(state.set_window(date, t(1, 7), t(2, 3)));
        assert_eq!(state.window, Some((at(18, 1, 5), at(18, 2, 0))));
        assert!(!state.set_window(date, t(3, 0), t(2, 0)));
        assert_eq!(state.window, Some((at(18, 1, 5), at(18, 2, 0))));
    }
}
