//! Tone synthesis for audible cues
//!
//! Short oscillator tones with a linear attack and exponential decay,
//! mixed straight into the output so staggered notes overlap into chimes.

use std::f32::consts::PI;
use std::time::Duration;

use rodio::Source;

use crate::audio::AudioEngine;

/// Sample rate of synthesized cue tones
const SAMPLE_RATE: u32 = 44_100;
/// Linear attack window at the head of each tone
const ATTACK_SECONDS: f32 = 0.05;
/// Gain floor the decay ramps toward
const DECAY_FLOOR: f32 = 0.001;
/// Tones keep decaying this long past their nominal duration before ending
const RELEASE_TAIL_SECONDS: f32 = 0.1;
/// Peak gain at full master volume
const PEAK_GAIN: f32 = 0.1;

/// Note frequencies used by the fixed cues
pub mod pitch {
    /// C5
    pub const C5: f32 = 523.25;
    /// E5
    pub const E5: f32 = 659.25;
    /// G5
    pub const G5: f32 = 783.99;
    /// UI feedback blip
    pub const BLIP: f32 = 600.0;
}

/// Oscillator shape for a synthesized tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    fn sample(&self, frequency: f32, t: f32) -> f32 {
        let cycle = (frequency * t).fract();
        match self {
            Waveform::Sine => (2.0 * PI * frequency * t).sin(),
            Waveform::Square => {
                if cycle < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (cycle - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * cycle - 1.0,
        }
    }
}

/// One synthesized tone with its envelope baked in
struct ToneSource {
    waveform: Waveform,
    frequency: f32,
    peak_gain: f32,
    frame: usize,
    attack_frames: usize,
    total_frames: usize,
    /// Per-frame multiplier of the exponential decay from peak to the floor
    decay_ratio: f32,
}

impl ToneSource {
    fn new(frequency: f32, waveform: Waveform, duration: f32, peak_gain: f32) -> Self {
        let nominal_frames = (duration * SAMPLE_RATE as f32) as usize;
        let attack_frames = ((ATTACK_SECONDS * SAMPLE_RATE as f32) as usize).min(nominal_frames);
        let total_frames = ((duration + RELEASE_TAIL_SECONDS) * SAMPLE_RATE as f32) as usize;
        let decay_frames = nominal_frames.saturating_sub(attack_frames).max(1);
        let decay_ratio =
            (DECAY_FLOOR / peak_gain.max(DECAY_FLOOR)).powf(1.0 / decay_frames as f32);

        Self {
            waveform,
            frequency,
            peak_gain,
            frame: 0,
            attack_frames,
            total_frames,
            decay_ratio,
        }
    }

    fn gain(&self) -> f32 {
        if self.frame < self.attack_frames {
            self.peak_gain * self.frame as f32 / self.attack_frames as f32
        } else {
            self.peak_gain * self.decay_ratio.powi((self.frame - self.attack_frames) as i32)
        }
    }
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.frame >= self.total_frames {
            return None;
        }
        let t = self.frame as f32 / SAMPLE_RATE as f32;
        let sample = self.waveform.sample(self.frequency, t) * self.gain();
        self.frame += 1;
        Some(sample)
    }
}

impl Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_frames as f32 / SAMPLE_RATE as f32,
        ))
    }
}

impl AudioEngine {
    /// Schedule one tone; `start_offset` delays it on the shared output
    ///
    /// The peak gain is sampled from the master volume at call time; a
    /// muted engine schedules nothing.
    pub fn play_tone(&self, frequency: f32, waveform: Waveform, duration: f32, start_offset: f32) {
        let peak_gain = PEAK_GAIN * self.volume();
        if peak_gain < f32::EPSILON {
            return;
        }
        let source = ToneSource::new(frequency, waveform, duration, peak_gain);
        self.play_source(source.delay(Duration::from_secs_f32(start_offset.max(0.0))));
    }

    /// Ascending two-note chime played when the countdown starts
    pub fn play_start(&self) {
        self.play_tone(pitch::C5, Waveform::Sine, 0.6, 0.0);
        self.play_tone(pitch::E5, Waveform::Sine, 0.6, 0.1);
    }

    /// Three-note chord played when a phase completes
    pub fn play_complete(&self) {
        self.play_tone(pitch::C5, Waveform::Sine, 0.5, 0.0);
        self.play_tone(pitch::E5, Waveform::Sine, 0.5, 0.1);
        self.play_tone(pitch::G5, Waveform::Sine, 1.0, 0.2);
    }

    /// Short feedback blip for UI interactions such as volume sliders
    pub fn play_blip(&self) {
        self.play_tone(pitch::BLIP, Waveform::Sine, 0.1, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_length_includes_release_tail() {
        let tone = ToneSource::new(440.0, Waveform::Sine, 0.5, 0.05);
        let expected = ((0.5 + RELEASE_TAIL_SECONDS) * SAMPLE_RATE as f32) as usize;
        assert_eq!(tone.count(), expected);
    }

    #[test]
    fn attack_ramps_linearly_to_peak() {
        let mut tone = ToneSource::new(440.0, Waveform::Sine, 0.5, 0.05);
        assert_eq!(tone.gain(), 0.0);

        tone.frame = tone.attack_frames / 2;
        assert!((tone.gain() - 0.025).abs() < 1e-4);

        tone.frame = tone.attack_frames;
        assert!((tone.gain() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn decay_reaches_the_floor_at_nominal_duration() {
        let duration = 0.5;
        let mut tone = ToneSource::new(440.0, Waveform::Sine, duration, 0.05);
        tone.frame = (duration * SAMPLE_RATE as f32) as usize;
        assert!(tone.gain() <= DECAY_FLOOR * 1.1);
    }

    #[test]
    fn samples_stay_within_peak_gain() {
        let tone = ToneSource::new(880.0, Waveform::Square, 0.2, 0.05);
        for sample in tone {
            assert!(sample.abs() <= 0.05 + 1e-6);
        }
    }

    #[test]
    fn waveforms_stay_normalized() {
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Triangle,
            Waveform::Sawtooth,
        ] {
            for i in 0..1000 {
                let t = i as f32 / SAMPLE_RATE as f32;
                let value = waveform.sample(440.0, t);
                assert!((-1.0..=1.0).contains(&value), "{:?} at {}", waveform, t);
            }
        }
    }

    #[test]
    fn muted_engine_plays_nothing_without_panicking() {
        let engine = AudioEngine::disabled();
        engine.set_volume(0.0);
        engine.play_tone(440.0, Waveform::Sine, 0.5, 0.0);
        engine.play_start();
        engine.play_complete();
        engine.play_blip();
    }
}
