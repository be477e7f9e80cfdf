//! Audio output engine
//!
//! Wraps the default rodio output device. The stream itself is owned by a
//! dedicated keep-alive thread because it is not `Send`; everything the
//! rest of the crate needs is the cloneable handle. When no device can be
//! opened the engine stays fully usable and every playback call is a
//! silent no-op, so the timer keeps working on headless machines.

use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;
use rodio::{OutputStream, OutputStreamHandle, Source};
use tracing::{debug, warn};

/// Default master volume for cue tones
const DEFAULT_MASTER_VOLUME: f32 = 0.5;

pub struct AudioEngine {
    handle: Option<OutputStreamHandle>,
    master_volume: Mutex<f32>,
}

impl AudioEngine {
    /// Open the default output device
    pub fn new() -> Self {
        let (handle_tx, handle_rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    if handle_tx.send(Some(handle)).is_err() {
                        return;
                    }
                    // Dropping the stream kills playback; park here to keep
                    // it alive for the lifetime of the process
                    let _stream = stream;
                    loop {
                        thread::park();
                    }
                }
                Err(e) => {
                    warn!("audio output unavailable: {}", e);
                    let _ = handle_tx.send(None);
                }
            });

        let handle = match spawned {
            Ok(_) => handle_rx.recv().unwrap_or(None),
            Err(e) => {
                warn!("failed to spawn audio output thread: {}", e);
                None
            }
        };

        if handle.is_some() {
            debug!("audio output ready");
        }

        Self {
            handle,
            master_volume: Mutex::new(DEFAULT_MASTER_VOLUME),
        }
    }

    /// Engine with no output; every playback call is a no-op
    pub fn disabled() -> Self {
        Self {
            handle: None,
            master_volume: Mutex::new(DEFAULT_MASTER_VOLUME),
        }
    }

    /// Whether an output device was opened
    pub fn is_available(&self) -> bool {
        self.handle.is_some()
    }

    /// Master volume for cue tones, in `[0, 1]`
    pub fn volume(&self) -> f32 {
        *self.master_volume.lock()
    }

    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        *self.master_volume.lock() = volume;
        debug!(volume, "master volume set");
    }

    /// Mix a fire-and-forget source into the output
    pub(crate) fn play_source<S>(&self, source: S)
    where
        S: Source<Item = f32> + Send + 'static,
    {
        if let Some(handle) = &self.handle {
            if let Err(e) = handle.play_raw(source) {
                warn!("audio playback failed: {}", e);
            }
        }
    }
}
