//! Main application state: the Pomodoro timer state machine
//!
//! `AppState` owns the live [`TimerState`] behind a mutex and is the only
//! writer. UI collaborators call its operations and observe it through the
//! display watch channel and the event broadcast; none of the operations
//! can fail. The per-second countdown runs as a background task spawned on
//! `start` and cancelled through a watch channel on `pause`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::audio::AudioEngine;
use crate::config::TimerConfig;
use crate::events::TimerEvent;
use crate::state::{DisplaySnapshot, PendingSwitch, Phase, TimerState};
use crate::tasks::countdown_task;

pub struct AppState {
    /// Live machine state; every operation locks, mutates, releases, then notifies
    timer: Mutex<TimerState>,
    /// Audio cues; silently inert when no output device exists
    audio: Arc<AudioEngine>,
    /// Channel for display updates
    display_tx: watch::Sender<DisplaySnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _display_rx: watch::Receiver<DisplaySnapshot>,
    /// Channel for transition events
    event_tx: broadcast::Sender<TimerEvent>,
    /// Cancellation handle of the currently running countdown task
    countdown_cancel: Mutex<Option<watch::Sender<bool>>>,
}

impl AppState {
    /// Create a paused machine in the work phase of the given config
    pub fn new(config: TimerConfig, audio: Arc<AudioEngine>) -> Self {
        let initial = TimerState::new(config);
        let (display_tx, display_rx) = watch::channel(initial.snapshot());
        let (event_tx, _) = broadcast::channel(100);

        Self {
            timer: Mutex::new(initial),
            audio,
            display_tx,
            _display_rx: display_rx,
            event_tx,
            countdown_cancel: Mutex::new(None),
        }
    }

    /// Subscribe to display updates; the current snapshot is immediately readable
    pub fn subscribe_display(&self) -> watch::Receiver<DisplaySnapshot> {
        self.display_tx.subscribe()
    }

    /// Subscribe to transition events
    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    /// Select a new mode
    ///
    /// Paused: takes effect immediately, resetting to a full work phase.
    /// Running: queued as the single pending switch (overwriting any prior
    /// one) and left for `toggle_start` to confirm; the current countdown
    /// is untouched. Selecting the currently active mode queues all the
    /// same.
    pub fn set_mode(&self, config: TimerConfig, preset_id: Option<i64>) {
        let queued = {
            let mut state = self.timer.lock();
            if state.running {
                state.pending = Some(PendingSwitch::new(config, preset_id));
                true
            } else {
                false
            }
        };

        if queued {
            info!(
                work_seconds = config.work_seconds,
                break_seconds = config.break_seconds,
                "mode switch queued until resume"
            );
            let _ = self.event_tx.send(TimerEvent::ModeQueued {
                work_seconds: config.work_seconds,
                break_seconds: config.break_seconds,
                at: Utc::now(),
            });
        } else {
            self.apply_mode(config, preset_id);
        }
    }

    /// Start, pause, or confirm a queued mode switch
    pub fn toggle_start(self: &Arc<Self>) {
        let pending = self.timer.lock().pending;
        if let Some(pending) = pending {
            // The user confirmed the queued switch by resuming
            self.apply_mode(pending.config, pending.preset_id());
            self.start();
        } else if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Begin or resume the countdown; no-op if already running
    pub fn start(self: &Arc<Self>) {
        let (phase, remaining) = {
            let mut state = self.timer.lock();
            if state.running {
                return;
            }
            state.running = true;
            if state.session_started_at.is_none() {
                state.session_started_at = Some(Utc::now());
            }
            (state.phase, state.remaining_seconds)
        };

        self.audio.play_start();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        *self.countdown_cancel.lock() = Some(cancel_tx);
        tokio::spawn(countdown_task(Arc::clone(self), cancel_rx));

        info!(?phase, remaining_seconds = remaining, "countdown started");
        let _ = self.event_tx.send(TimerEvent::Started {
            phase,
            remaining_seconds: remaining,
            at: Utc::now(),
        });
    }

    /// Pause the countdown, preserving remaining time; no-op if already paused
    pub fn pause(&self) {
        let (phase, remaining) = {
            let mut state = self.timer.lock();
            if !state.running {
                return;
            }
            state.running = false;
            (state.phase, state.remaining_seconds)
        };

        self.halt_countdown();

        info!(?phase, remaining_seconds = remaining, "countdown paused");
        let _ = self.event_tx.send(TimerEvent::Paused {
            phase,
            remaining_seconds: remaining,
            at: Utc::now(),
        });
    }

    /// One countdown second, invoked by the background task
    ///
    /// Decrements and emits a display update; the tick that exhausts the
    /// countdown also performs the phase switch.
    pub fn tick(self: &Arc<Self>) {
        let (snapshot, expired) = {
            let mut state = self.timer.lock();
            if !state.running {
                return;
            }
            if state.remaining_seconds > 0 {
                state.remaining_seconds -= 1;
            }
            (state.snapshot(), state.remaining_seconds == 0)
        };

        self.emit_display(snapshot);
        if expired {
            debug!("countdown expired naturally");
            self.switch_mode();
        }
    }

    /// End the current phase and move to the next one
    ///
    /// Exposed as the manual skip; also invoked on natural expiry. Any
    /// pending switch is discarded: it only applies when the user resumes
    /// before the phase completes. Work flips to Break when a break is
    /// configured (auto-started), otherwise resets to a paused work phase;
    /// Break always flips back to an auto-started Work.
    pub fn switch_mode(self: &Arc<Self>) {
        {
            let mut state = self.timer.lock();
            state.running = false;
        }
        self.halt_countdown();
        self.audio.play_complete();

        let (completed, snapshot, auto_start) = {
            let mut state = self.timer.lock();
            if state.pending.take().is_some() {
                info!("pending mode switch cancelled by phase completion");
            }
            let completed = state.phase;
            state.session_started_at = None;

            let auto_start = match state.phase {
                Phase::Work if state.active_config.has_break() => {
                    state.phase = Phase::Break;
                    state.remaining_seconds = state.active_config.break_seconds;
                    true
                }
                Phase::Work => {
                    // No break configured: rewind the work phase and wait
                    state.remaining_seconds = state.active_config.work_seconds;
                    false
                }
                Phase::Break => {
                    state.phase = Phase::Work;
                    state.remaining_seconds = state.active_config.work_seconds;
                    true
                }
            };
            (completed, state.snapshot(), auto_start)
        };

        self.emit_display(snapshot);
        info!(completed_phase = ?completed, auto_start, "phase switched");
        let _ = self.event_tx.send(TimerEvent::PhaseCompleted {
            phase: completed,
            at: Utc::now(),
        });

        if auto_start {
            self.start();
        }
    }

    /// Check if the countdown is running
    pub fn is_running(&self) -> bool {
        self.timer.lock().running
    }

    /// Phase currently counting down
    pub fn current_phase(&self) -> Phase {
        self.timer.lock().phase
    }

    /// Seconds left in the current phase
    pub fn remaining_seconds(&self) -> u64 {
        self.timer.lock().remaining_seconds
    }

    /// Queued mode switch, if any
    pub fn pending_switch(&self) -> Option<PendingSwitch> {
        self.timer.lock().pending
    }

    /// Config the countdown is currently based on
    pub fn active_config(&self) -> TimerConfig {
        self.timer.lock().active_config
    }

    /// Id of the active custom preset, if one is selected
    pub fn active_preset_id(&self) -> Option<i64> {
        self.timer.lock().active_preset_id
    }

    /// When the current session began, if the countdown ever started
    pub fn session_started_at(&self) -> Option<DateTime<Utc>> {
        self.timer.lock().session_started_at
    }

    /// Full copy of the live state
    pub fn timer_state(&self) -> TimerState {
        self.timer.lock().clone()
    }

    /// Apply a config right away, resetting to a paused work phase
    fn apply_mode(&self, config: TimerConfig, preset_id: Option<i64>) {
        self.halt_countdown();
        let snapshot = {
            let mut state = self.timer.lock();
            state.apply_config(config, preset_id);
            state.snapshot()
        };

        self.emit_display(snapshot);
        info!(
            work_seconds = config.work_seconds,
            break_seconds = config.break_seconds,
            "mode applied"
        );
        let _ = self.event_tx.send(TimerEvent::ModeApplied {
            work_seconds: config.work_seconds,
            break_seconds: config.break_seconds,
            at: Utc::now(),
        });
    }

    /// Cancel the countdown task, if one is running
    fn halt_countdown(&self) {
        if let Some(cancel_tx) = self.countdown_cancel.lock().take() {
            let _ = cancel_tx.send(true);
        }
    }

    fn emit_display(&self, snapshot: DisplaySnapshot) {
        if let Err(e) = self.display_tx.send(snapshot) {
            tracing::warn!("failed to send display update: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn machine(work_minutes: u64, break_minutes: u64) -> Arc<AppState> {
        Arc::new(AppState::new(
            TimerConfig::from_minutes(work_minutes, break_minutes),
            Arc::new(AudioEngine::disabled()),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn set_mode_while_idle_applies_immediately() {
        let state = machine(25, 5);
        state.set_mode(TimerConfig::from_minutes(50, 10), None);

        assert_eq!(state.remaining_seconds(), 3000);
        assert_eq!(state.current_phase(), Phase::Work);
        assert!(!state.is_running());
        assert!(state.pending_switch().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn set_mode_while_running_only_queues() {
        let state = machine(25, 5);
        state.start();
        state.tick();

        state.set_mode(TimerConfig::from_minutes(50, 10), Some(9));

        assert_eq!(state.remaining_seconds(), 1499);
        assert_eq!(state.current_phase(), Phase::Work);
        assert!(state.is_running());
        let pending = state.pending_switch().expect("switch should be queued");
        assert_eq!(pending.config.work_seconds, 3000);
        assert_eq!(pending.preset_id(), Some(9));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_selection_overwrites_pending() {
        let state = machine(25, 5);
        state.start();

        state.set_mode(TimerConfig::from_minutes(50, 10), None);
        state.set_mode(TimerConfig::from_minutes(15, 3), Some(2));

        let pending = state.pending_switch().expect("switch should be queued");
        assert_eq!(pending.config.work_seconds, 900);
        assert_eq!(pending.preset_id(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_active_mode_while_running_still_queues() {
        let state = machine(25, 5);
        state.start();

        state.set_mode(state.active_config(), None);

        assert!(state.pending_switch().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_with_pending_applies_and_starts() {
        let state = machine(25, 5);
        state.start();
        state.tick();
        state.set_mode(TimerConfig::from_minutes(50, 10), Some(4));

        state.toggle_start();

        assert!(state.pending_switch().is_none());
        assert_eq!(state.active_config().work_seconds, 3000);
        assert_eq!(state.active_preset_id(), Some(4));
        assert_eq!(state.current_phase(), Phase::Work);
        assert_eq!(state.remaining_seconds(), 3000);
        assert!(state.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_alternates_start_and_pause() {
        let state = machine(25, 5);

        state.toggle_start();
        assert!(state.is_running());

        state.toggle_start();
        assert!(!state.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn natural_expiry_discards_pending() {
        let state = machine(25, 5);
        state.start();
        state.set_mode(TimerConfig::from_minutes(50, 10), None);

        for _ in 0..1500 {
            state.tick();
        }

        assert!(state.pending_switch().is_none());
        // The discarded switch must not have been applied
        assert_eq!(state.active_config().work_seconds, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn work_phase_flips_to_break_on_final_tick() {
        let state = machine(25, 5);
        state.start();

        for _ in 0..1500 {
            assert!(state.is_running());
            state.tick();
        }

        assert_eq!(state.current_phase(), Phase::Break);
        assert_eq!(state.remaining_seconds(), 300);
        assert!(state.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn break_expiry_returns_to_running_work() {
        let state = machine(25, 5);
        state.start();
        state.switch_mode();
        assert_eq!(state.current_phase(), Phase::Break);

        for _ in 0..300 {
            state.tick();
        }

        assert_eq!(state.current_phase(), Phase::Work);
        assert_eq!(state.remaining_seconds(), 1500);
        assert!(state.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn no_break_mode_rewinds_work_without_autostart() {
        let state = machine(25, 0);
        state.start();

        for _ in 0..1500 {
            state.tick();
        }

        assert_eq!(state.current_phase(), Phase::Work);
        assert_eq!(state.remaining_seconds(), 1500);
        assert!(!state.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_preserves_remaining_and_session_start() {
        let state = machine(25, 5);
        state.start();
        state.tick();
        state.tick();
        let started_at = state.session_started_at();
        assert!(started_at.is_some());

        state.pause();

        assert!(!state.is_running());
        assert_eq!(state.remaining_seconds(), 1498);
        assert_eq!(state.session_started_at(), started_at);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_noop_while_running() {
        let state = machine(25, 5);
        state.start();
        let started_at = state.session_started_at();

        state.start();

        assert!(state.is_running());
        assert_eq!(state.session_started_at(), started_at);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_skip_discards_pending_and_autostarts_break() {
        let state = machine(25, 5);
        state.start();
        state.set_mode(TimerConfig::from_minutes(50, 10), None);

        state.switch_mode();

        assert!(state.pending_switch().is_none());
        assert_eq!(state.current_phase(), Phase::Break);
        assert_eq!(state.remaining_seconds(), 300);
        assert!(state.is_running());
        assert!(state.session_started_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn switch_clears_session_start_for_new_phase() {
        let state = machine(25, 0);
        state.start();
        state.switch_mode();
        // No auto-start, so the cleared session start stays empty
        assert!(state.session_started_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_decrement_within_phase_bounds() {
        let state = machine(1, 1);
        state.start();
        for _ in 0..45 {
            state.tick();
        }
        assert_eq!(state.current_phase(), Phase::Work);
        assert_eq!(state.remaining_seconds(), 15);
        let total = state.active_config().duration_for(state.current_phase());
        assert!(state.remaining_seconds() <= total);
    }

    #[tokio::test(start_paused = true)]
    async fn display_updates_on_tick() {
        let state = machine(25, 5);
        let display_rx = state.subscribe_display();
        assert_eq!(display_rx.borrow().formatted_time, "25:00");

        state.start();
        state.tick();

        let snapshot = display_rx.borrow().clone();
        assert_eq!(snapshot.formatted_time, "24:59");
        assert_eq!(snapshot.phase_label, "Work Time");
        assert!(snapshot.progress < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_task_ticks_once_per_second() {
        let state = machine(25, 5);
        state.start();

        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(state.remaining_seconds(), 1497);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_countdown_task() {
        let state = machine(25, 5);
        state.start();
        tokio::time::sleep(Duration::from_millis(2100)).await;
        state.pause();

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(state.remaining_seconds(), 1498);
    }

    #[tokio::test(start_paused = true)]
    async fn events_trace_the_lifecycle() {
        let state = machine(25, 5);
        let mut events = state.subscribe_events();

        state.start();
        state.set_mode(TimerConfig::from_minutes(50, 10), None);
        state.pause();

        assert!(matches!(events.try_recv(), Ok(TimerEvent::Started { .. })));
        assert!(matches!(events.try_recv(), Ok(TimerEvent::ModeQueued { .. })));
        assert!(matches!(events.try_recv(), Ok(TimerEvent::Paused { .. })));
    }
}
