//! Display-sink payloads: formatted countdown, phase label, progress

use serde::Serialize;

use crate::state::Phase;

/// One display update, emitted on every tick and transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    /// Countdown formatted as `MM:SS`
    pub formatted_time: String,
    /// Human-readable phase label ("Work Time" / "Break Time")
    pub phase_label: &'static str,
    /// Remaining fraction of the current phase, in `[0, 1]`
    pub progress: f64,
}

impl DisplaySnapshot {
    pub fn new(remaining_seconds: u64, phase: Phase, progress: f64) -> Self {
        Self {
            formatted_time: format_clock(remaining_seconds),
            phase_label: phase.label(),
            progress,
        }
    }
}

/// Format seconds as zero-padded `MM:SS`; hours spill into the minute field
pub fn format_clock(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
