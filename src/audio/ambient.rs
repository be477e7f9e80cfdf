//! Seamless ambient loop via overlapping crossfaded segments
//!
//! One fixed buffer loops forever: each playback segment fades in over the
//! overlap window, holds, and fades out over the overlap window ending at
//! its own stop time. Consecutive segments' windows coincide, so the
//! fade-out of one sums with the fade-in of the next at roughly constant
//! loudness. Segments are planned against the audio clock a fixed horizon
//! ahead of time, which keeps poll jitter out of playback.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::Source;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::audio::{AmbientBuffer, AudioClock, AudioEngine, StreamClock};
use crate::error::AudioError;
use crate::tasks::ambient_lookahead_task;

/// Crossfade overlap between consecutive segments
const OVERLAP_SECONDS: f64 = 5.0;
/// How far ahead of the audio clock segments are scheduled
const LOOKAHEAD_HORIZON: f64 = 0.5;
/// Gap between `start()` and the first segment
const LEAD_IN_SECONDS: f64 = 0.1;
/// Time constant of live volume retargeting
const VOLUME_SMOOTHING_SECONDS: f32 = 0.1;
/// Fade applied to live segments when the loop stops
const STOP_FADE_SECONDS: f64 = 0.8;
/// Hard stop after the stop fade
const STOP_HARD_SECONDS: f64 = 1.0;
/// Finished segments linger this long in the active set before pruning
const CLEANUP_GRACE_SECONDS: f64 = 0.2;
/// Default ambient volume
const DEFAULT_AMBIENT_VOLUME: f32 = 0.5;

/// One playback instance of the looping buffer, as absolute clock times
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    /// Audio-clock second the segment starts at
    pub start: f64,
    /// Audio-clock second playback ends (start plus the full buffer)
    pub stop: f64,
    /// Crossfade window at both ends
    pub fade: f64,
}

/// Pure scheduling core of the ambient loop
///
/// Owns the strictly increasing `next_start` cursor and the active-segment
/// bookkeeping; knows nothing about real time or audio output, so it can
/// be driven by any clock value.
#[derive(Debug)]
pub struct LoopScheduler {
    playing: bool,
    buffer_duration: f64,
    fade: f64,
    next_start: f64,
    active: Vec<SegmentPlan>,
}

impl LoopScheduler {
    /// Start a fresh plan; overlap is clamped to half the buffer duration
    /// so short buffers still leave a hold region between their fades
    pub fn begin(buffer_duration: f64, now: f64) -> Self {
        let fade = OVERLAP_SECONDS.min(buffer_duration / 2.0);
        Self {
            playing: true,
            buffer_duration,
            fade,
            next_start: now + LEAD_IN_SECONDS,
            active: Vec::new(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Effective crossfade window
    pub fn fade(&self) -> f64 {
        self.fade
    }

    /// Segments that must be scheduled now to keep the horizon covered
    ///
    /// Batches as many segments as the horizon requires, so one late poll
    /// cannot leave a gap. Also prunes segments whose stop time passed by
    /// more than the cleanup grace period.
    pub fn due_segments(&mut self, now: f64) -> Vec<SegmentPlan> {
        if !self.playing {
            return Vec::new();
        }

        let mut due = Vec::new();
        while self.next_start < now + LOOKAHEAD_HORIZON {
            let plan = SegmentPlan {
                start: self.next_start,
                stop: self.next_start + self.buffer_duration,
                fade: self.fade,
            };
            self.active.push(plan);
            due.push(plan);
            self.next_start += self.buffer_duration - self.fade;
        }

        self.active
            .retain(|plan| now <= plan.stop + CLEANUP_GRACE_SECONDS);
        due
    }

    /// Stop producing segments
    pub fn halt(&mut self) {
        self.playing = false;
    }

    /// Drop the bookkeeping once stop fades have elapsed
    pub fn clear_active(&mut self) {
        self.active.clear();
    }

    pub fn active_segments(&self) -> &[SegmentPlan] {
        &self.active
    }

    /// Number of segments audible at the given instant
    pub fn concurrent_at(&self, at: f64) -> usize {
        self.active
            .iter()
            .filter(|plan| plan.start <= at && at < plan.stop)
            .count()
    }
}

/// Live controls shared with every in-flight segment source
struct AmbientControl {
    /// Target volume, stored as f32 bits
    target_volume: AtomicU32,
    /// Set on stop; each live source latches it into its own fade-out
    stopping: AtomicBool,
}

impl AmbientControl {
    fn new(volume: f32) -> Self {
        Self {
            target_volume: AtomicU32::new(volume.to_bits()),
            stopping: AtomicBool::new(false),
        }
    }

    fn target_volume(&self) -> f32 {
        f32::from_bits(self.target_volume.load(Ordering::Relaxed))
    }
}

/// Fade-out state a source enters when the loop stops
struct StopRamp {
    fade_left: usize,
    fade_total: usize,
    hard_left: usize,
}

/// Renders one crossfaded segment of the ambient buffer
///
/// The crossfade envelope is fixed by the plan; the volume gain chases the
/// shared target with a short time constant so live volume changes reach
/// already-playing segments without a click. A stop ramp, once latched,
/// runs to silence even if the loop is restarted meanwhile.
struct SegmentSource {
    samples: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
    pos: usize,
    fade_frames: usize,
    total_frames: usize,
    control: Arc<AmbientControl>,
    gain: f32,
    smoothing: f32,
    stop_ramp: Option<StopRamp>,
}

impl SegmentSource {
    fn new(buffer: &AmbientBuffer, plan: &SegmentPlan, control: Arc<AmbientControl>) -> Self {
        let sample_rate = buffer.sample_rate();
        let channels = buffer.channels();
        let samples = buffer.samples();
        let total_frames = samples.len() / channels as usize;
        let fade_frames = (plan.fade * sample_rate as f64) as usize;
        // Per-frame step of the one-pole volume smoother
        let smoothing = 1.0 - (-1.0 / (VOLUME_SMOOTHING_SECONDS * sample_rate as f32)).exp();
        let gain = control.target_volume();

        Self {
            samples,
            channels,
            sample_rate,
            pos: 0,
            fade_frames,
            total_frames,
            control,
            gain,
            smoothing,
            stop_ramp: None,
        }
    }

    /// Crossfade envelope at a frame index: ramp in, hold, ramp out
    fn envelope(&self, frame: usize) -> f32 {
        if self.fade_frames == 0 {
            return 1.0;
        }
        if frame < self.fade_frames {
            frame as f32 / self.fade_frames as f32
        } else if frame + self.fade_frames >= self.total_frames {
            (self.total_frames - frame) as f32 / self.fade_frames as f32
        } else {
            1.0
        }
    }

    /// Per-frame gain update: volume smoothing plus the latched stop ramp
    fn advance_frame(&mut self) {
        let target = self.control.target_volume();
        self.gain += (target - self.gain) * self.smoothing;

        if self.stop_ramp.is_none() && self.control.stopping.load(Ordering::Relaxed) {
            let fade = (STOP_FADE_SECONDS * self.sample_rate as f64) as usize;
            let hard = (STOP_HARD_SECONDS * self.sample_rate as f64) as usize;
            self.stop_ramp = Some(StopRamp {
                fade_left: fade,
                fade_total: fade.max(1),
                hard_left: hard,
            });
        }

        if let Some(ramp) = &mut self.stop_ramp {
            ramp.fade_left = ramp.fade_left.saturating_sub(1);
            ramp.hard_left = ramp.hard_left.saturating_sub(1);
        }
    }

    fn stop_gain(&self) -> f32 {
        match &self.stop_ramp {
            None => 1.0,
            Some(ramp) => ramp.fade_left as f32 / ramp.fade_total as f32,
        }
    }
}

impl Iterator for SegmentSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos >= self.samples.len() {
            return None;
        }
        if self.pos % self.channels as usize == 0 {
            self.advance_frame();
            if let Some(ramp) = &self.stop_ramp {
                if ramp.hard_left == 0 {
                    return None;
                }
            }
        }

        let frame = self.pos / self.channels as usize;
        let sample = self.samples[self.pos] * self.envelope(frame) * self.gain * self.stop_gain();
        self.pos += 1;
        Some(sample)
    }
}

impl Source for SegmentSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.total_frames as f64 / self.sample_rate as f64,
        ))
    }
}

/// Where the ambient buffer comes from
enum BufferSource {
    Path(PathBuf),
    Loaded(AmbientBuffer),
}

struct LoopInner {
    source: BufferSource,
    /// Decode cache; filled on first successful start
    buffer: Option<AmbientBuffer>,
    scheduler: Option<LoopScheduler>,
    cancel_tx: Option<watch::Sender<bool>>,
}

/// Controller for the seamless ambient loop
///
/// Independent of the timer state machine: it owns its own lookahead task
/// and reacts only to explicit `start`/`stop`/`set_volume` calls.
pub struct AmbientLoop {
    engine: Arc<AudioEngine>,
    clock: Arc<dyn AudioClock>,
    control: Arc<AmbientControl>,
    inner: Mutex<LoopInner>,
}

impl AmbientLoop {
    /// Loop that decodes its buffer from a file on first start
    pub fn from_path(engine: Arc<AudioEngine>, path: impl Into<PathBuf>) -> Self {
        Self::with_source(engine, BufferSource::Path(path.into()))
    }

    /// Loop over an already decoded buffer
    pub fn with_buffer(engine: Arc<AudioEngine>, buffer: AmbientBuffer) -> Self {
        Self::with_source(engine, BufferSource::Loaded(buffer))
    }

    fn with_source(engine: Arc<AudioEngine>, source: BufferSource) -> Self {
        Self {
            engine,
            clock: Arc::new(StreamClock::new()),
            control: Arc::new(AmbientControl::new(DEFAULT_AMBIENT_VOLUME)),
            inner: Mutex::new(LoopInner {
                source,
                buffer: None,
                scheduler: None,
                cancel_tx: None,
            }),
        }
    }

    /// Begin looping; no-op when already playing or when audio is unavailable
    ///
    /// Loading or decoding the buffer is the only fallible step: on error
    /// the loop stays stopped and the caller gets the reason. The timer is
    /// unaffected either way.
    pub fn start(self: &Arc<Self>) -> Result<(), AudioError> {
        if !self.engine.is_available() {
            debug!("ambient loop start skipped: audio output unavailable");
            return Ok(());
        }

        let cancel_rx = {
            let mut inner = self.inner.lock();
            if inner.scheduler.as_ref().is_some_and(|s| s.is_playing()) {
                return Ok(());
            }

            let buffer = match &inner.buffer {
                Some(buffer) => buffer.clone(),
                None => {
                    let loaded = match &inner.source {
                        BufferSource::Path(path) => AmbientBuffer::from_path(path)?,
                        BufferSource::Loaded(buffer) => buffer.clone(),
                    };
                    inner.buffer = Some(loaded.clone());
                    loaded
                }
            };

            // A restart must not cancel the latched fade-outs of segments
            // from the previous run; they observe `stopping` only once
            self.control.stopping.store(false, Ordering::Relaxed);
            inner.scheduler = Some(LoopScheduler::begin(
                buffer.duration_seconds(),
                self.clock.now(),
            ));

            let (cancel_tx, cancel_rx) = watch::channel(false);
            inner.cancel_tx = Some(cancel_tx);
            cancel_rx
        };

        tokio::spawn(ambient_lookahead_task(Arc::clone(self), cancel_rx));
        info!("ambient loop started");
        Ok(())
    }

    /// Stop looping: live segments fade to silence instead of cutting off
    pub fn stop(self: &Arc<Self>) {
        let cancel_tx = {
            let mut inner = self.inner.lock();
            let Some(scheduler) = inner.scheduler.as_mut() else {
                return;
            };
            if !scheduler.is_playing() {
                return;
            }
            scheduler.halt();
            inner.cancel_tx.take()
        };

        self.control.stopping.store(true, Ordering::Relaxed);
        if let Some(cancel_tx) = cancel_tx {
            let _ = cancel_tx.send(true);
        }
        info!("ambient loop stopping; live segments fading out");

        // Purge the bookkeeping once every stop fade has run out
        let ambient = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(STOP_HARD_SECONDS)).await;
            let mut inner = ambient.inner.lock();
            if let Some(scheduler) = inner.scheduler.as_mut() {
                if !scheduler.is_playing() {
                    scheduler.clear_active();
                }
            }
        });
    }

    /// Retarget the volume, in `[0, 1]`
    ///
    /// Future segments pick it up at construction; live segments chase it
    /// over a short time constant, so there is no discontinuity.
    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.control
            .target_volume
            .store(volume.to_bits(), Ordering::Relaxed);
        debug!(volume, "ambient volume set");
    }

    pub fn volume(&self) -> f32 {
        self.control.target_volume()
    }

    pub fn is_playing(&self) -> bool {
        self.inner
            .lock()
            .scheduler
            .as_ref()
            .is_some_and(|s| s.is_playing())
    }

    /// Number of segments currently tracked by the scheduler
    pub fn active_segment_count(&self) -> usize {
        self.inner
            .lock()
            .scheduler
            .as_ref()
            .map(|s| s.active_segments().len())
            .unwrap_or(0)
    }

    /// One lookahead pass; returns false once the loop has stopped
    pub(crate) fn poll(&self) -> bool {
        let now = self.clock.now();
        let (due, buffer) = {
            let mut inner = self.inner.lock();
            let Some(scheduler) = inner.scheduler.as_mut() else {
                return false;
            };
            if !scheduler.is_playing() {
                return false;
            }
            let due = scheduler.due_segments(now);
            let Some(buffer) = inner.buffer.clone() else {
                return false;
            };
            (due, buffer)
        };

        for plan in due {
            let delay = (plan.start - now).max(0.0);
            let source = SegmentSource::new(&buffer, &plan, Arc::clone(&self.control));
            self.engine
                .play_source(source.delay(Duration::from_secs_f64(delay)));
        }
        true
    }
}
