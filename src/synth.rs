//! Procedural synthesis of the intro cues
//!
//! Every effect is built from scratch out of a noise buffer or an
//! oscillator, a gain envelope and (for the fly-by) a low-pass filter
//! and a stereo panner. No samples are loaded.
//!
//! Builders never schedule a stop: each voice ends when its gain
//! envelope reaches its floor or its buffer runs out.

use crate::context::AudioContext;
use crate::cue::{CueEffect, CueKind, ImpactBoomParams, NoiseSweepParams, ToneSweepParams};
use crate::error::Result;
use crate::graph::VoiceGraph;
use crate::mixer::GraphHandle;
use crate::nodes::{GainNode, LowPassFilterNode, NoiseBufferNode, OscillatorNode, StereoPannerNode};
use crate::param::{AudioParam, FLOOR};
use tracing::debug;

/// Builds cue graphs and connects them to a context
#[derive(Debug, Default, Clone, Copy)]
pub struct ToneSynthesizer;

impl ToneSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Build whichever graph `effect` describes, starting at `when`
    pub fn build(
        &self,
        ctx: &mut dyn AudioContext,
        effect: &CueEffect,
        when: f64,
    ) -> Result<GraphHandle> {
        match effect {
            CueEffect::NoiseSweep(params) => self.build_noise_sweep(ctx, params, when),
            CueEffect::ToneSweep(params) => self.build_tone_sweep(ctx, params, when),
            CueEffect::ImpactBoom(params) => self.build_impact_boom(ctx, params, when),
        }
    }

    pub fn build_noise_sweep(
        &self,
        ctx: &mut dyn AudioContext,
        params: &NoiseSweepParams,
        when: f64,
    ) -> Result<GraphHandle> {
        let graph = noise_sweep_graph(params, ctx.sample_rate(), when)?;
        connect(ctx, graph)
    }

    pub fn build_tone_sweep(
        &self,
        ctx: &mut dyn AudioContext,
        params: &ToneSweepParams,
        when: f64,
    ) -> Result<GraphHandle> {
        let graph = tone_sweep_graph(params, ctx.sample_rate(), when)?;
        connect(ctx, graph)
    }

    pub fn build_impact_boom(
        &self,
        ctx: &mut dyn AudioContext,
        params: &ImpactBoomParams,
        when: f64,
    ) -> Result<GraphHandle> {
        let graph = impact_boom_graph(params, ctx.sample_rate(), when)?;
        connect(ctx, graph)
    }
}

fn connect(ctx: &mut dyn AudioContext, graph: VoiceGraph) -> Result<GraphHandle> {
    debug!("Connecting {:?}", graph);
    ctx.connect(graph)
}

/// Jet fly-by: noise -> low-pass -> gain -> panner
///
/// The cutoff opens exponentially until the closest pass at
/// `peak_fraction` of the duration and closes again by the end. The level
/// fades in linearly, then decays exponentially to [`FLOOR`]. The pan
/// sweeps linearly from `pan_from` to `pan_to` and holds there.
pub fn noise_sweep_graph(
    params: &NoiseSweepParams,
    sample_rate: f32,
    when: f64,
) -> Result<VoiceGraph> {
    params.validate()?;
    let duration = params.duration;
    let end = when + duration;

    let noise = match params.seed {
        Some(seed) => NoiseBufferNode::new_with_seed(duration, sample_rate, seed),
        None => NoiseBufferNode::new(duration, sample_rate),
    };

    let mut cutoff = AudioParam::new(params.filter_start_hz);
    cutoff
        .set_value_at_time(params.filter_start_hz, when)?
        .exponential_ramp_to_value_at_time(params.filter_peak_hz, when + duration * params.peak_fraction)?
        .exponential_ramp_to_value_at_time(params.filter_end_hz, end)?;

    let mut gain = AudioParam::new(0.0);
    gain.set_value_at_time(0.0, when)?
        .linear_ramp_to_value_at_time(params.peak_gain, when + duration * params.fade_in_fraction)?
        .exponential_ramp_to_value_at_time(FLOOR, end)?;

    let mut pan = AudioParam::new(params.pan_from);
    pan.set_value_at_time(params.pan_from, when)?
        .linear_ramp_to_value_at_time(params.pan_to, when + duration * params.pan_fraction)?;

    Ok(VoiceGraph::new(CueKind::NoiseSweep, Box::new(noise), GainNode::new(gain), when)
        .with_processor(Box::new(LowPassFilterNode::new(cutoff, params.filter_q)))
        .with_panner(StereoPannerNode::new(pan)))
}

/// Falling whistle: oscillator -> gain
pub fn tone_sweep_graph(
    params: &ToneSweepParams,
    _sample_rate: f32,
    when: f64,
) -> Result<VoiceGraph> {
    params.validate()?;
    let end = when + params.duration;

    let mut frequency = AudioParam::new(params.start_hz);
    frequency
        .set_value_at_time(params.start_hz, when)?
        .exponential_ramp_to_value_at_time(params.end_hz, end)?;

    // Linear fade to 0
    let mut gain = AudioParam::new(0.0);
    gain.set_value_at_time(params.gain, when)?
        .linear_ramp_to_value_at_time(0.0, end)?;

    Ok(VoiceGraph::new(
        CueKind::ToneSweep,
        Box::new(OscillatorNode::new(frequency, params.waveform)),
        GainNode::new(gain),
        when,
    ))
}

/// Impact: oscillator diving to sub-audio -> decaying gain
pub fn impact_boom_graph(
    params: &ImpactBoomParams,
    _sample_rate: f32,
    when: f64,
) -> Result<VoiceGraph> {
    params.validate()?;

    let mut frequency = AudioParam::new(params.start_hz);
    frequency
        .set_value_at_time(params.start_hz, when)?
        .exponential_ramp_to_value_at_time(params.end_hz, when + params.sweep_duration)?;

    let mut gain = AudioParam::new(0.0);
    gain.set_value_at_time(params.peak_gain, when)?
        .exponential_ramp_to_value_at_time(FLOOR, when + params.decay_duration)?;

    Ok(VoiceGraph::new(
        CueKind::ImpactBoom,
        Box::new(OscillatorNode::new(frequency, params.waveform)),
        GainNode::new(gain),
        when,
    ))
}
