//! Background tasks module
//!
//! This module contains the two background loops driving the engine: the
//! per-second countdown tick and the ambient-loop lookahead poll. They are
//! independent of each other and individually cancellable.

pub mod countdown;
pub mod lookahead;

// Re-export main functions
pub use countdown::countdown_task;
pub use lookahead::ambient_lookahead_task;
