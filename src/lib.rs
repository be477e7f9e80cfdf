//! Focus Flow - A state-managed Pomodoro timer engine
//!
//! This crate provides the core of a Pomodoro productivity timer: a
//! work/break countdown state machine with deferred mode switching, a
//! catalog of built-in and user-defined presets, synthesized audio cues,
//! and a seamlessly crossfaded ambient noise loop.
//!
//! The UI is an external collaborator: it calls the operations on
//! [`AppState`] and observes the machine through the display watch channel
//! and the event broadcast. None of the operations can fail, and all audio
//! degrades to silent no-ops when no output device exists.
//!
//! ```no_run
//! use std::sync::Arc;
//! use focus_flow::{AmbientLoop, AppState, AudioEngine, PresetCatalog, PresetStore, TimerConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let audio = Arc::new(AudioEngine::new());
//! let timer = Arc::new(AppState::new(TimerConfig::default(), Arc::clone(&audio)));
//! let mut catalog = PresetCatalog::with_store(PresetStore::new("presets.json"));
//! let ambient = Arc::new(AmbientLoop::from_path(Arc::clone(&audio), "rain.ogg"));
//!
//! let preset = catalog.add_custom("Writing", "45", "15", true);
//! timer.set_mode(preset.timer_config(), Some(preset.id));
//! timer.toggle_start();
//! let _ = ambient.start();
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod presets;
pub mod state;
pub mod tasks;

// Re-export commonly used types
pub use audio::{AmbientBuffer, AmbientLoop, AudioEngine, Waveform};
pub use config::TimerConfig;
pub use error::AudioError;
pub use events::TimerEvent;
pub use presets::{Preset, PresetCatalog, PresetStore};
pub use state::{AppState, DisplaySnapshot, PendingSwitch, Phase, SwitchKind, TimerState};

/// Initialize tracing with an env-filter for embedders that want logs
///
/// Applications embedding the engine typically install their own
/// subscriber; this is the convenience default.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_flow={}", level))
        .init();
}
