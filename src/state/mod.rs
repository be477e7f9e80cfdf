//! State management module
//!
//! This module contains all state-related structures and their management logic.

pub mod app_state;
pub mod display;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use display::{format_clock, DisplaySnapshot};
pub use timer_state::{PendingSwitch, Phase, SwitchKind, TimerState};
