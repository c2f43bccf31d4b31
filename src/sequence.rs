//! Sequence controller: the intro's state machine and scheduler
//!
//! `start()` spawns a single scheduler task that walks the timeline's
//! offset groups in order, sleeping until each one is due. A late
//! wake-up runs every overdue group back to back, still in offset order.
//! Each group locks the shared state before acting, and teardown
//! (completion or `cancel()`) removes the session under the same lock,
//! so no notification can run once teardown has returned.
//!
//! Two clocks are bridged here: the scheduler runs on tokio's monotonic clock
//! (dispatch granularity) while cues are started at
//! `audio_zero + offset` on the audio context's own clock
//! (sample-accurate).

use crate::engine::CuePlayer;
use crate::error::FlypastError;
use crate::observer::PhaseObserver;
use crate::timeline::{Phase, PhaseTimeline, TimelineAction, TimelineGroup};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Result of [`SequenceController::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Sequence running with audio
    Started,
    /// Sequence running without audio (no usable audio environment)
    Silent,
    /// A session was already started; nothing happened
    Ignored,
}

/// Runtime record of the one playthrough
struct Session {
    scheduler: JoinHandle<()>,
    /// Context time that corresponds to offset zero
    audio_zero: f64,
    silent: bool,
}

struct Shared<E, O> {
    engine: E,
    observer: O,
    phase: Phase,
    session: Option<Session>,
    started: bool,
    completed: bool,
    cancelled: bool,
    done: watch::Sender<bool>,
}

impl<E: CuePlayer, O: PhaseObserver> Shared<E, O> {
    fn complete(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        self.phase = Phase::Complete;
        if !self.completed {
            self.completed = true;
            self.observer.on_complete();
        }

        session.scheduler.abort();
        self.engine.dispose();
        info!("Sequence complete");
        let _ = self.done.send(true);
    }

    fn cancel(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        self.cancelled = true;
        session.scheduler.abort();
        self.engine.dispose();
        info!("Sequence cancelled during phase {}", self.phase);
        let _ = self.done.send(true);
    }
}

pub struct SequenceController<E: CuePlayer + 'static, O: PhaseObserver + 'static> {
    shared: Arc<Mutex<Shared<E, O>>>,
    timeline: Arc<PhaseTimeline>,
    done: watch::Receiver<bool>,
}

impl<E: CuePlayer + 'static, O: PhaseObserver + 'static> SequenceController<E, O> {
    pub fn new(engine: E, timeline: PhaseTimeline, observer: O) -> Self {
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            shared: Arc::new(Mutex::new(Shared {
                engine,
                observer,
                phase: Phase::Idle,
                session: None,
                started: false,
                completed: false,
                cancelled: false,
                done: done_tx,
            })),
            timeline: Arc::new(timeline),
            done: done_rx,
        }
    }

    /// Start the sequence
    ///
    /// Only the first call does anything. Audio problems never stop the
    /// sequence: the phases run on schedule without sound.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self) -> StartOutcome {
        let mut shared = lock(&self.shared);
        if shared.started {
            debug!("Ignoring start: {}", FlypastError::AlreadyRunning);
            return StartOutcome::Ignored;
        }
        shared.started = true;

        let outcome = match shared.engine.ensure_ready() {
            Ok(()) => StartOutcome::Started,
            Err(FlypastError::UnsupportedAudioEnvironment(reason)) => {
                warn!("Running intro without sound: {}", reason);
                StartOutcome::Silent
            }
            Err(e) => {
                warn!("Audio engine failed to start, running silently: {}", e);
                StartOutcome::Silent
            }
        };

        let audio_zero = match outcome {
            StartOutcome::Started => shared.engine.current_time().unwrap_or(0.0),
            _ => 0.0,
        };
        let zero = Instant::now();

        // The lock is held until the session exists, so the scheduler
        // cannot observe a half-built session
        let scheduler = {
            let shared = Arc::clone(&self.shared);
            let groups = self.timeline.groups();
            tokio::spawn(async move {
                for group in groups {
                    time::sleep_until(zero + Duration::from_secs_f64(group.offset)).await;
                    if !fire(&shared, group) {
                        break;
                    }
                }
            })
        };

        shared.session = Some(Session {
            scheduler,
            audio_zero,
            silent: outcome == StartOutcome::Silent,
        });

        info!(
            "Sequence started ({:?}, {:.2}s)",
            outcome,
            self.timeline.total_duration()
        );
        outcome
    }

    /// Abort the session: no notification fires after this returns
    pub fn cancel(&self) {
        lock(&self.shared).cancel();
    }

    pub fn phase(&self) -> Phase {
        lock(&self.shared).phase
    }

    /// A session is running (started, neither completed nor cancelled)
    pub fn is_active(&self) -> bool {
        lock(&self.shared).session.is_some()
    }

    pub fn is_complete(&self) -> bool {
        lock(&self.shared).completed
    }

    pub fn is_cancelled(&self) -> bool {
        lock(&self.shared).cancelled
    }

    pub fn timeline(&self) -> &PhaseTimeline {
        &self.timeline
    }

    /// Wait until the session completes or is cancelled
    pub async fn wait_until_complete(&self) {
        let mut done = self.done.clone();
        // Err only if the sender is gone, which means the state is gone too
        let _ = done.wait_for(|finished| *finished).await;
    }
}

impl<E: CuePlayer + 'static, O: PhaseObserver + 'static> Drop for SequenceController<E, O> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run one group's actions; false once the session is gone
fn fire<E: CuePlayer, O: PhaseObserver>(
    shared: &Mutex<Shared<E, O>>,
    group: TimelineGroup,
) -> bool {
    let mut guard = lock(shared);
    let state = &mut *guard;

    // Torn down while the scheduler was waiting for the lock
    let Some(session) = state.session.as_mut() else {
        return false;
    };

    for action in group.actions {
        match action {
            TimelineAction::SetPhase(phase) => {
                debug!("+{:.3}s phase {}", group.offset, phase);
                state.phase = phase;
                state.observer.on_phase_change(phase);
            }
            TimelineAction::FireCue(cue) => {
                if session.silent {
                    continue;
                }
                let when = session.audio_zero + group.offset;
                if let Err(e) = state.engine.play_cue(&cue, when) {
                    warn!("Cue {} failed, continuing silently: {}", cue.kind(), e);
                    session.silent = true;
                }
            }
            TimelineAction::Complete => {
                state.complete();
                return false;
            }
        }
    }
    true
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::AudioCue;
    use crate::error::Result;
    use crate::observer::{ChannelObserver, ObserverEvent};

    #[derive(Default)]
    struct CountingPlayer {
        cues: usize,
    }

    impl CuePlayer for CountingPlayer {
        fn ensure_ready(&mut self) -> Result<()> {
            Ok(())
        }

        fn play_cue(&mut self, _cue: &AudioCue, _when: f64) -> Result<()> {
            self.cues += 1;
            Ok(())
        }

        fn current_time(&self) -> Option<f64> {
            Some(0.0)
        }

        fn dispose(&mut self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_moves_to_complete() {
        let (observer, mut rx) = ChannelObserver::new();
        let controller =
            SequenceController::new(CountingPlayer::default(), PhaseTimeline::reference(), observer);

        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.start(), StartOutcome::Started);
        assert!(controller.is_active());

        controller.wait_until_complete().await;
        assert_eq!(controller.phase(), Phase::Complete);
        assert!(controller.is_complete());
        assert!(!controller.is_active());

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ObserverEvent::PhaseChanged(Phase::Approaching),
                ObserverEvent::PhaseChanged(Phase::InFlight),
                ObserverEvent::PhaseChanged(Phase::Impact),
                ObserverEvent::Completed,
            ]
        );
        assert_eq!(lock(&controller.shared).engine.cues, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_ignored() {
        let (observer, _rx) = ChannelObserver::new();
        let controller =
            SequenceController::new(CountingPlayer::default(), PhaseTimeline::reference(), observer);

        assert_eq!(controller.start(), StartOutcome::Started);
        assert_eq!(controller.start(), StartOutcome::Ignored);
        controller.wait_until_complete().await;
        assert_eq!(controller.start(), StartOutcome::Ignored);
        assert_eq!(lock(&controller.shared).engine.cues, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_group() {
        let (observer, mut rx) = ChannelObserver::new();
        let controller =
            SequenceController::new(CountingPlayer::default(), PhaseTimeline::reference(), observer);

        controller.start();
        controller.cancel();
        controller.cancel();
        controller.wait_until_complete().await;

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(controller.is_cancelled());
        assert!(!controller.is_complete());
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_wakeup_runs_overdue_groups_in_order() {
        let (observer, mut rx) = ChannelObserver::new();
        let controller =
            SequenceController::new(CountingPlayer::default(), PhaseTimeline::reference(), observer);

        controller.start();
        // Every deadline has passed before the scheduler is first polled
        time::advance(Duration::from_secs(3)).await;
        controller.wait_until_complete().await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ObserverEvent::PhaseChanged(Phase::Approaching),
                ObserverEvent::PhaseChanged(Phase::InFlight),
                ObserverEvent::PhaseChanged(Phase::Impact),
                ObserverEvent::Completed,
            ]
        );
        assert_eq!(lock(&controller.shared).engine.cues, 3);
    }
}
