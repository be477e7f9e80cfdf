//! Ambient-loop lookahead background task

use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tokio::time::interval;
use tracing::debug;

use crate::audio::AmbientLoop;

/// Wall-clock polling period of the segment scheduler
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll the ambient loop so segments stay scheduled ahead of the audio clock
///
/// The poll only needs to outrun the scheduling horizon; jitter here does
/// not reach playback because segments are timed against the audio clock,
/// not against this interval.
pub async fn ambient_lookahead_task(ambient: Arc<AmbientLoop>, mut cancel_rx: watch::Receiver<bool>) {
    let mut polls = interval(POLL_INTERVAL);

    debug!("ambient lookahead task started");

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => {
                break;
            }
            _ = polls.tick() => {
                if !ambient.poll() {
                    break;
                }
            }
        }
    }

    debug!("ambient lookahead task stopped");
}
