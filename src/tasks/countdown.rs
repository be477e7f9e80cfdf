//! Countdown background task

use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::debug;

use crate::state::AppState;

/// Drive the state machine with one tick per second until cancelled
///
/// Cancellation arrives through the watch channel handed out by
/// `AppState::start`; replacing or dropping the sender also ends the task.
/// The select is biased so a cancelled task never races an elapsed tick.
pub async fn countdown_task(state: Arc<AppState>, mut cancel_rx: watch::Receiver<bool>) {
    let period = Duration::from_secs(1);
    let mut ticks = interval_at(Instant::now() + period, period);

    debug!("countdown task started");

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => {
                break;
            }
            _ = ticks.tick() => {
                state.tick();
            }
        }
    }

    debug!("countdown task stopped");
}
