//! Audio engine lifecycle against instrumented contexts

use flypast::{
    AudioContext, AudioCue, AudioEngine, ContextState, CueEffect, CuePlayer, FlypastError,
    GraphHandle, ImpactBoomParams, OfflineContext, Result, VoiceGraph,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counters {
    created: AtomicUsize,
    resumed: AtomicUsize,
    closed: AtomicUsize,
    connected: AtomicUsize,
}

/// Offline context that counts lifecycle calls and starts suspended,
/// like a browser context created before a user gesture
struct CountingContext {
    inner: OfflineContext,
    counters: Arc<Counters>,
    fail_close: bool,
}

impl AudioContext for CountingContext {
    fn sample_rate(&self) -> f32 {
        self.inner.sample_rate()
    }

    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    fn state(&self) -> ContextState {
        self.inner.state()
    }

    fn resume(&mut self) -> Result<()> {
        self.counters.resumed.fetch_add(1, Ordering::SeqCst);
        self.inner.resume()
    }

    fn suspend(&mut self) -> Result<()> {
        self.inner.suspend()
    }

    fn close(&mut self) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(FlypastError::Disposal("context already closed".into()));
        }
        self.inner.close()
    }

    fn connect(&mut self, graph: VoiceGraph) -> Result<GraphHandle> {
        self.counters.connected.fetch_add(1, Ordering::SeqCst);
        self.inner.connect(graph)
    }
}

fn engine(fail_close: bool) -> (AudioEngine, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let shared = counters.clone();
    let engine = AudioEngine::new(Box::new(move || -> Result<Box<dyn AudioContext>> {
        shared.created.fetch_add(1, Ordering::SeqCst);
        let mut inner = OfflineContext::new(8000.0, 1.0);
        inner.suspend()?;
        Ok(Box::new(CountingContext {
            inner,
            counters: shared.clone(),
            fail_close,
        }))
    }));
    (engine, counters)
}

fn boom() -> AudioCue {
    AudioCue::new(1.6, CueEffect::ImpactBoom(ImpactBoomParams::default()))
}

#[test]
fn test_context_is_created_lazily_and_resumed() {
    let (mut engine, counters) = engine(false);
    assert_eq!(counters.created.load(Ordering::SeqCst), 0);

    engine.ensure_ready().unwrap();
    engine.ensure_ready().unwrap();
    assert_eq!(counters.created.load(Ordering::SeqCst), 1);
    assert_eq!(counters.resumed.load(Ordering::SeqCst), 1);
    assert!(engine.is_ready());
}

#[test]
fn test_cues_reach_the_context() {
    let (mut engine, counters) = engine(false);
    engine.ensure_ready().unwrap();

    engine.play_cue(&boom(), 1.6).unwrap();
    engine.play_cue(&boom(), 2.0).unwrap();
    assert_eq!(counters.connected.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dispose_any_number_of_times() {
    let (mut engine, counters) = engine(false);
    engine.dispose();
    assert_eq!(counters.closed.load(Ordering::SeqCst), 0);

    engine.ensure_ready().unwrap();
    engine.dispose();
    engine.dispose();
    engine.dispose();
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    assert!(engine.current_time().is_none());
    assert!(matches!(
        engine.play_cue(&boom(), 0.0),
        Err(FlypastError::NotReady)
    ));
}

#[test]
fn test_disposal_error_is_swallowed() {
    let (mut engine, counters) = engine(true);
    engine.ensure_ready().unwrap();
    engine.dispose();
    engine.dispose();
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_releases_context() {
    let (mut engine, counters) = engine(false);
    engine.ensure_ready().unwrap();
    drop(engine);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_invalid_cue_is_reported() {
    let (mut engine, _) = engine(false);
    engine.ensure_ready().unwrap();

    let broken = AudioCue::new(
        0.0,
        CueEffect::ImpactBoom(ImpactBoomParams {
            decay_duration: 0.0,
            ..Default::default()
        }),
    );
    assert!(matches!(
        engine.play_cue(&broken, 0.0),
        Err(FlypastError::InvalidCue(_))
    ));
}
