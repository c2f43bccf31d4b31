//! Audio contexts: the host audio environment a session renders into
//!
//! An `AudioContext` owns a destination [`Mixer`] and a clock. Graphs are
//! connected to it and start at absolute times on that clock. Contexts
//! are created through a `ContextFactory` so the engine can create one
//! lazily and tests can substitute their own.

use crate::error::{FlypastError, Result};
use crate::graph::VoiceGraph;
use crate::mixer::{GraphHandle, Mixer};
use std::fmt;
use tracing::debug;

/// Lifecycle state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not rendering; the clock is frozen
    Suspended,
    Running,
    /// Released; cannot be resumed
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A live audio processing context
pub trait AudioContext: Send {
    fn sample_rate(&self) -> f32;

    /// Seconds on the context's own clock
    fn current_time(&self) -> f64;

    fn state(&self) -> ContextState;

    fn resume(&mut self) -> Result<()>;

    fn suspend(&mut self) -> Result<()>;

    /// Release the context. Closing twice yields `FlypastError::Disposal`.
    fn close(&mut self) -> Result<()>;

    /// Hand a graph to the destination; it plays from its own start time
    fn connect(&mut self, graph: VoiceGraph) -> Result<GraphHandle>;
}

/// Creates contexts on demand
pub trait ContextFactory: Send {
    fn create(&self) -> Result<Box<dyn AudioContext>>;
}

impl<F> ContextFactory for F
where
    F: Fn() -> Result<Box<dyn AudioContext>> + Send,
{
    fn create(&self) -> Result<Box<dyn AudioContext>> {
        self()
    }
}

/// Factory for hosts without audio (or with audio disabled)
#[derive(Debug, Clone)]
pub struct UnsupportedContextFactory {
    reason: String,
}

impl UnsupportedContextFactory {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ContextFactory for UnsupportedContextFactory {
    fn create(&self) -> Result<Box<dyn AudioContext>> {
        Err(FlypastError::UnsupportedAudioEnvironment(self.reason.clone()))
    }
}

/// Factory producing in-memory offline contexts
#[derive(Debug, Clone)]
pub struct OfflineContextFactory {
    pub sample_rate: f32,
    pub master_gain: f32,
}

impl ContextFactory for OfflineContextFactory {
    fn create(&self) -> Result<Box<dyn AudioContext>> {
        Ok(Box::new(OfflineContext::new(self.sample_rate, self.master_gain)))
    }
}

/// Context that renders into memory on demand
///
/// The clock only advances when [`OfflineContext::render`] is called.
pub struct OfflineContext {
    mixer: Mixer,
    state: ContextState,
}

impl OfflineContext {
    pub fn new(sample_rate: f32, master_gain: f32) -> Self {
        Self {
            mixer: Mixer::new(sample_rate, master_gain),
            state: ContextState::Running,
        }
    }

    /// Render `frames` stereo frames in blocks of `block_size`
    pub fn render(&mut self, frames: usize, block_size: usize) -> (Vec<f32>, Vec<f32>) {
        let block_size = block_size.max(1);
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];

        if self.state != ContextState::Running {
            return (left, right);
        }

        for (l, r) in left.chunks_mut(block_size).zip(right.chunks_mut(block_size)) {
            self.mixer.render(l, r);
        }
        (left, right)
    }

    /// Render until the clock reaches `time` (seconds)
    pub fn render_until(&mut self, time: f64, block_size: usize) -> (Vec<f32>, Vec<f32>) {
        let target = (time * self.mixer.sample_rate() as f64).ceil().max(0.0) as u64;
        let frames = target.saturating_sub(self.mixer.frames_rendered()) as usize;
        self.render(frames, block_size)
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.active_voices()
    }
}

impl AudioContext for OfflineContext {
    fn sample_rate(&self) -> f32 {
        self.mixer.sample_rate()
    }

    fn current_time(&self) -> f64 {
        self.mixer.current_time()
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        match self.state {
            ContextState::Closed => Err(FlypastError::NotReady),
            _ => {
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    fn suspend(&mut self) -> Result<()> {
        match self.state {
            ContextState::Closed => Err(FlypastError::NotReady),
            _ => {
                self.state = ContextState::Suspended;
                Ok(())
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(FlypastError::Disposal("offline context already closed".into()));
        }
        self.mixer.clear();
        self.state = ContextState::Closed;
        debug!("Offline context closed at {:.3}s", self.mixer.current_time());
        Ok(())
    }

    fn connect(&mut self, graph: VoiceGraph) -> Result<GraphHandle> {
        if self.state == ContextState::Closed {
            return Err(FlypastError::NotReady);
        }
        Ok(self.mixer.connect(graph))
    }
}
