//! Placeholder signal classification.
//!
//! No model runs. The stub only records that a run happened so the log
//! view has something to show.

use cassandra_core::types::Timestamp;

use crate::state::ViewState;

/// Models offered by the viewer.
pub const MODELS: [&str; 3] = ["1-D CNN", "Simple RNN", "Transformer"];

/// Append the three log lines of a stub run to `state.logs`.
pub fn run_inference_stub(model: &str, state: &mut ViewState, now: Timestamp) {
    tracing::info!(model, "Running inference stub");
    state.logs.extend([
        format!("[ok] {} - Started {model}", now.format("%H:%M:%S UTC")),
        "[warn] 00:00:01 - No peaks found (stub)".to_string(),
        "[ok] 00:00:02 - Finished (stub)".to_string(),
    ]);
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn appends_three_lines_and_nothing_else() {
        let mut state = ViewState::default();
        state.logs.push("earlier".into());
        let mut expected = state.clone();

        run_inference_stub("Simple RNN", &mut state, Utc.with_ymd_and_hms(2020, 4, 18, 1, 2, 3).unwrap());

        expected.logs.extend([
            "[ok] 01:02:03 UTC - Started Simple RNN".to_string(),
            "[warn] 00:00:01 - No peaks found (stub)".to_string(),
            "[ok] 00:00:02 - Finished (stub)".to_string(),
        ]);
        assert_eq!(state, expected);
    }
}
