/// All artifact timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Station identifier, e.g. `ExperimentalG4`.
pub type StationId = String;
