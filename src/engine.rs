//! Audio engine: owns the single audio context of one session
//!
//! The context is created lazily on first use, so a session that never
//! plays audio never touches the device. A failed creation is
//! remembered; the engine does not retry within the same session.

use crate::context::{AudioContext, ContextFactory, ContextState, UnsupportedContextFactory};
use crate::cue::AudioCue;
use crate::error::{FlypastError, Result};
use crate::synth::ToneSynthesizer;
use tracing::{debug, info, warn};

/// What the sequence controller needs from an audio backend
pub trait CuePlayer: Send {
    /// Acquire (or resume) the audio context
    fn ensure_ready(&mut self) -> Result<()>;

    /// Start the cue's graph at `when` on the context clock
    fn play_cue(&mut self, cue: &AudioCue, when: f64) -> Result<()>;

    /// Context clock, `None` without a live context
    fn current_time(&self) -> Option<f64>;

    /// Release the context. Safe to call any number of times.
    fn dispose(&mut self);
}

pub struct AudioEngine {
    factory: Box<dyn ContextFactory>,
    context: Option<Box<dyn AudioContext>>,
    synth: ToneSynthesizer,
    unavailable: Option<String>,
}

impl AudioEngine {
    pub fn new(factory: Box<dyn ContextFactory>) -> Self {
        Self {
            factory,
            context: None,
            synth: ToneSynthesizer::new(),
            unavailable: None,
        }
    }

    /// Engine for hosts without audio; every session runs silently
    pub fn silent() -> Self {
        Self::new(Box::new(UnsupportedContextFactory::new("audio disabled")))
    }

    pub fn is_ready(&self) -> bool {
        self.context
            .as_ref()
            .is_some_and(|ctx| ctx.state() == ContextState::Running)
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(|ctx| ctx.state())
    }
}

impl CuePlayer for AudioEngine {
    fn ensure_ready(&mut self) -> Result<()> {
        if let Some(reason) = &self.unavailable {
            return Err(FlypastError::UnsupportedAudioEnvironment(reason.clone()));
        }

        if self.context.is_none() {
            match self.factory.create() {
                Ok(ctx) => {
                    info!(
                        "Audio context created at {} Hz ({})",
                        ctx.sample_rate(),
                        ctx.state()
                    );
                    self.context = Some(ctx);
                }
                Err(FlypastError::UnsupportedAudioEnvironment(reason)) => {
                    warn!("Audio unavailable: {}", reason);
                    self.unavailable = Some(reason.clone());
                    return Err(FlypastError::UnsupportedAudioEnvironment(reason));
                }
                Err(e) => return Err(e),
            }
        }

        let ctx = self.context.as_mut().ok_or(FlypastError::NotReady)?;
        match ctx.state() {
            ContextState::Running => Ok(()),
            ContextState::Suspended => {
                ctx.resume()?;
                debug!("Audio context resumed");
                Ok(())
            }
            ContextState::Closed => Err(FlypastError::NotReady),
        }
    }

    fn play_cue(&mut self, cue: &AudioCue, when: f64) -> Result<()> {
        let ctx = match self.context.as_mut() {
            Some(ctx) if ctx.state() != ContextState::Closed => ctx,
            _ => return Err(FlypastError::NotReady),
        };

        let handle = self.synth.build(&mut **ctx, &cue.effect, when)?;
        debug!(
            "Cue {} scheduled at {:.3}s (voice {})",
            cue.kind(),
            when,
            handle.id
        );
        Ok(())
    }

    fn current_time(&self) -> Option<f64> {
        self.context
            .as_ref()
            .filter(|ctx| ctx.state() != ContextState::Closed)
            .map(|ctx| ctx.current_time())
    }

    fn dispose(&mut self) {
        let Some(mut ctx) = self.context.take() else {
            return;
        };

        match ctx.close() {
            Ok(()) => info!("Audio context closed"),
            Err(FlypastError::Disposal(reason)) => debug!("Ignoring disposal error: {}", reason),
            Err(e) => warn!("Failed to close audio context: {}", e),
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
