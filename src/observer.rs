//! Phase observers
//!
//! Observers own everything visual. They receive one-way notifications
//! from the sequence controller and never feed anything back.

use crate::timeline::Phase;
use tokio::sync::mpsc;
use tracing::info;

pub trait PhaseObserver: Send {
    /// Called for every phase transition, in order
    fn on_phase_change(&mut self, phase: Phase);

    /// Called exactly once when the sequence finishes
    fn on_complete(&mut self);
}

impl<T: PhaseObserver + ?Sized> PhaseObserver for Box<T> {
    fn on_phase_change(&mut self, phase: Phase) {
        (**self).on_phase_change(phase)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }
}

/// Logs transitions through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl PhaseObserver for LoggingObserver {
    fn on_phase_change(&mut self, phase: Phase) {
        info!("Phase: {}", phase);
    }

    fn on_complete(&mut self) {
        info!("Intro complete");
    }
}

/// Notification forwarded by [`ChannelObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverEvent {
    PhaseChanged(Phase),
    Completed,
}

/// Forwards notifications to an async consumer (a UI task, a test)
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ObserverEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ObserverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PhaseObserver for ChannelObserver {
    fn on_phase_change(&mut self, phase: Phase) {
        // A dropped receiver just means nobody is watching any more
        let _ = self.tx.send(ObserverEvent::PhaseChanged(phase));
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(ObserverEvent::Completed);
    }
}
