//! Error types
//!
//! Timer operations are infallible by design; the only fallible surface is
//! loading the ambient audio source. A missing output device is not an
//! error at all: the engine degrades to silent no-ops.

use thiserror::Error;

/// Failures loading or decoding the ambient audio source
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to read ambient audio source: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode ambient audio source: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("ambient audio source contains no samples")]
    EmptyBuffer,
}
