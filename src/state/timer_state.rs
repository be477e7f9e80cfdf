//! Timer state structures: phase, pending switch, and the live machine state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TimerConfig;
use crate::state::DisplaySnapshot;

/// Work or break portion of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    /// Status label shown by the display sink
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Work Time",
            Phase::Break => "Break Time",
        }
    }
}

/// Where a queued mode change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    /// One of the built-in mode buttons
    Standard,
    /// A stored custom preset, by id
    Custom(i64),
}

/// A mode change deferred until the user explicitly resumes
///
/// At most one exists at a time; a newer selection overwrites it. It is
/// applied by `toggle_start` and discarded when a phase expires naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSwitch {
    pub kind: SwitchKind,
    pub config: TimerConfig,
}

impl PendingSwitch {
    pub fn new(config: TimerConfig, preset_id: Option<i64>) -> Self {
        Self {
            kind: match preset_id {
                Some(id) => SwitchKind::Custom(id),
                None => SwitchKind::Standard,
            },
            config,
        }
    }

    /// Preset id carried by the switch, if it targets a custom preset
    pub fn preset_id(&self) -> Option<i64> {
        match self.kind {
            SwitchKind::Custom(id) => Some(id),
            SwitchKind::Standard => None,
        }
    }
}

/// The live countdown state
///
/// `remaining_seconds` always lies in `[0, active_config.duration_for(phase)]`,
/// and `running == true` implies `session_started_at` is set.
#[derive(Debug, Clone)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub running: bool,
    pub active_config: TimerConfig,
    pub active_preset_id: Option<i64>,
    pub pending: Option<PendingSwitch>,
    pub session_started_at: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Create a fresh, paused work-phase state for the given config
    pub fn new(config: TimerConfig) -> Self {
        Self {
            phase: Phase::Work,
            remaining_seconds: config.work_seconds,
            running: false,
            active_config: config,
            active_preset_id: None,
            pending: None,
            session_started_at: None,
        }
    }

    /// Replace the active config and reset to a paused work phase
    ///
    /// Any queued switch is cancelled; `session_started_at` is left as-is
    /// (only a phase switch clears it).
    pub fn apply_config(&mut self, config: TimerConfig, preset_id: Option<i64>) {
        self.pending = None;
        self.active_config = config;
        self.active_preset_id = preset_id;
        self.phase = Phase::Work;
        self.remaining_seconds = config.work_seconds;
        self.running = false;
    }

    /// Countdown length of the phase currently counting down
    pub fn phase_duration(&self) -> u64 {
        self.active_config.duration_for(self.phase)
    }

    /// Remaining fraction of the current phase, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        let total = self.phase_duration();
        if total == 0 {
            return 0.0;
        }
        self.remaining_seconds as f64 / total as f64
    }

    /// Snapshot for the display sink
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot::new(self.remaining_seconds, self.phase, self.progress())
    }
}
