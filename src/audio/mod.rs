//! Audio subsystem: output engine, cue tones, and the ambient crossfade loop
//!
//! Everything here degrades gracefully: with no output device the engine
//! reports unavailable and every playback call becomes a silent no-op, so
//! the timer never depends on audio working.

pub mod ambient;
pub mod buffer;
pub mod clock;
pub mod engine;
pub mod tones;

// Re-export main types
pub use ambient::{AmbientLoop, LoopScheduler, SegmentPlan};
pub use buffer::AmbientBuffer;
pub use clock::{AudioClock, StreamClock};
pub use engine::AudioEngine;
pub use tones::{pitch, Waveform};
