//! # Flypast - Procedural Onboarding Intro
//!
//! Flypast plays a one-shot audio-visual intro before a user reaches the
//! main application: a jet fly-by, a capsule drop with a falling whistle
//! and an impact boom. Every sound is synthesized on the fly; no audio
//! assets are shipped.
//!
//! ## Core Features
//!
//! - **Sample-accurate automation**: Web Audio style `AudioParam` curves
//!   (set, linear ramp, exponential ramp) drive frequency, gain and pan
//! - **Procedural cues**: filtered noise sweep, falling tone, impact boom
//! - **Declarative timeline**: one `(offset, action)` table drives phases and cues
//! - **Cancellable scheduler**: one tokio task walks the timeline in offset order
//! - **Graceful degradation**: without an audio device the visuals run silently
//! - **Offline rendering**: the whole sequence renders to a stereo WAV file
//!
//! ## Quick Start
//!
//! ```no_run
//! use flypast::{
//!     AudioEngine, DeviceContextFactory, LoggingObserver, PhaseTimeline, SequenceController,
//! };
//!
//! # async fn run() {
//! let engine = AudioEngine::new(Box::new(DeviceContextFactory::new(1.0)));
//! let controller =
//!     SequenceController::new(engine, PhaseTimeline::reference(), LoggingObserver);
//!
//! controller.start();
//! controller.wait_until_complete().await;
//! # }
//! ```
//!
//! ### Rendering to a file
//!
//! ```no_run
//! use flypast::{PhaseTimeline, RenderConfig, SequenceRenderer};
//! use std::path::Path;
//!
//! let renderer = SequenceRenderer::new(RenderConfig::default());
//! let stats = renderer
//!     .render_to_file(&PhaseTimeline::reference(), Path::new("intro.wav"))
//!     .unwrap();
//! stats.print_summary();
//! ```
//!
//! ## Modules
//!
//! - [`param`]: automation curves
//! - [`nodes`]: block-processing audio nodes
//! - [`graph`] / [`mixer`]: one-shot voice graphs and the destination mixer
//! - [`context`] / [`device`]: offline and real-time audio contexts
//! - [`synth`]: cue graph builders
//! - [`engine`]: the per-session audio engine
//! - [`timeline`] / [`sequence`] / [`observer`]: scheduling and notification
//! - [`config`], [`render`], [`assistant`], [`flow`]

pub mod assistant;
pub mod audio_node;
pub mod config;
pub mod context;
pub mod cue;
pub mod device;
pub mod engine;
pub mod error;
pub mod flow;
pub mod graph;
pub mod mixer;
pub mod nodes;
pub mod observer;
pub mod param;
pub mod render;
pub mod sequence;
pub mod synth;
pub mod timeline;

pub use config::{AudioConfig, FlypastConfig};
pub use context::{
    AudioContext, ContextFactory, ContextState, OfflineContext, OfflineContextFactory,
    UnsupportedContextFactory,
};
pub use cue::{AudioCue, CueConfig, CueEffect, CueKind, ImpactBoomParams, NoiseSweepParams, ToneSweepParams};
pub use device::{DeviceContext, DeviceContextFactory};
pub use engine::{AudioEngine, CuePlayer};
pub use error::{FlypastError, Result};
pub use flow::{AppStage, OnboardingFlow};
pub use graph::VoiceGraph;
pub use mixer::GraphHandle;
pub use observer::{ChannelObserver, LoggingObserver, ObserverEvent, PhaseObserver};
pub use param::{AudioParam, FLOOR};
pub use render::{RenderConfig, RenderStats, RenderedAudio, SequenceRenderer};
pub use sequence::{SequenceController, StartOutcome};
pub use synth::ToneSynthesizer;
pub use timeline::{Phase, PhaseTimeline, TimelineAction, TimelineConfig, TimelineEntry};
