//! Broadcast events for external observers
//!
//! Every state machine transition produces an event. Integrations
//! subscribe via [`AppState::subscribe_events`](crate::state::AppState::subscribe_events);
//! the display channel stays the primary sink for per-tick updates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::Phase;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started {
        phase: Phase,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    /// Countdown paused by the user
    Paused {
        phase: Phase,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    /// A phase ended, naturally or via manual skip
    PhaseCompleted { phase: Phase, at: DateTime<Utc> },
    /// A mode change was queued while the timer was running
    ModeQueued {
        work_seconds: u64,
        break_seconds: u64,
        at: DateTime<Utc>,
    },
    /// A mode change took effect (immediately or from the queue)
    ModeApplied {
        work_seconds: u64,
        break_seconds: u64,
        at: DateTime<Utc>,
    },
}
