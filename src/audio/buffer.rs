//! Decoded ambient audio buffer

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, Source};

use crate::error::AudioError;

/// The fully decoded ambient source, interleaved f32 PCM
///
/// Cloning is cheap; the sample data is shared. Every in-flight segment
/// holds its own reference, so the buffer stays valid for as long as
/// anything is still fading out.
#[derive(Debug, Clone)]
pub struct AmbientBuffer {
    samples: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl AmbientBuffer {
    /// Decode an audio file (WAV/MP3/OGG/FLAC) from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let file = BufReader::new(File::open(path)?);
        Self::decode(file)
    }

    /// Decode from an in-memory byte slice, e.g. embedded asset data
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, AudioError> {
        Self::decode(Cursor::new(bytes.into()))
    }

    /// Build directly from PCM samples
    pub fn from_samples(
        samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        if samples.is_empty() || channels == 0 || sample_rate == 0 {
            return Err(AudioError::EmptyBuffer);
        }
        Ok(Self {
            samples: Arc::new(samples),
            channels,
            sample_rate,
        })
    }

    fn decode<R>(reader: R) -> Result<Self, AudioError>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        let decoder = Decoder::new(reader)?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples().collect();
        Self::from_samples(samples, channels, sample_rate)
    }

    pub(crate) fn samples(&self) -> Arc<Vec<f32>> {
        Arc::clone(&self.samples)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback length in seconds
    pub fn duration_seconds(&self) -> f64 {
        let frames = self.samples.len() as f64 / self.channels as f64;
        frames / self.sample_rate as f64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accounts_for_channels() {
        let buffer = AmbientBuffer::from_samples(vec![0.0; 88_200], 2, 44_100).expect("buffer");
        assert!((buffer.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_samples_are_rejected() {
        assert!(AmbientBuffer::from_samples(Vec::new(), 2, 44_100).is_err());
        assert!(AmbientBuffer::from_samples(vec![0.0; 100], 0, 44_100).is_err());
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        assert!(AmbientBuffer::from_bytes(vec![0u8; 64]).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AmbientBuffer::from_path("/nonexistent/rain.wav").expect_err("should fail");
        assert!(matches!(err, AudioError::Io(_)));
    }
}
