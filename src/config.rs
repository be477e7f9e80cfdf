//! Timer configuration and input normalization

use serde::{Deserialize, Serialize};

use crate::state::Phase;

/// Default work phase length in minutes, used when input is missing or invalid
pub const DEFAULT_WORK_MINUTES: u64 = 25;

/// Default break phase length in minutes, used when input is missing or invalid
pub const DEFAULT_BREAK_MINUTES: u64 = 5;

/// Immutable work/break durations for one timer mode
///
/// `break_seconds == 0` means the mode has no break phase: the machine
/// returns to a paused work phase instead of entering a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub work_seconds: u64,
    pub break_seconds: u64,
}

impl TimerConfig {
    /// Build a config from whole minutes; zero work minutes fall back to the default
    pub fn from_minutes(work_minutes: u64, break_minutes: u64) -> Self {
        let work_minutes = if work_minutes == 0 {
            DEFAULT_WORK_MINUTES
        } else {
            work_minutes
        };
        Self {
            work_seconds: work_minutes * 60,
            break_seconds: break_minutes * 60,
        }
    }

    /// Build a config from raw form input
    ///
    /// Non-numeric or zero work minutes become 25; non-numeric break
    /// minutes become 5. A parsed break of 0 is kept (no break phase).
    pub fn from_minute_inputs(work: &str, break_input: &str) -> Self {
        Self::from_minutes(
            parse_minutes(work).unwrap_or(DEFAULT_WORK_MINUTES),
            parse_minutes(break_input).unwrap_or(DEFAULT_BREAK_MINUTES),
        )
    }

    /// Countdown length for the given phase
    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_seconds,
            Phase::Break => self.break_seconds,
        }
    }

    /// Whether this mode has a break phase at all
    pub fn has_break(&self) -> bool {
        self.break_seconds > 0
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_WORK_MINUTES, DEFAULT_BREAK_MINUTES)
    }
}

/// Parse a minutes field, tolerating surrounding whitespace
pub fn parse_minutes(input: &str) -> Option<u64> {
    input.trim().parse::<u64>().ok()
}
