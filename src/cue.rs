//! Declarative audio cue templates
//!
//! A cue describes one synthesized effect: what to build and when,
//! relative to sequence start. Cues are immutable templates; the graph
//! that realizes one is created fresh every time it fires.

use crate::error::{FlypastError, Result};
use crate::nodes::Waveform;
use crate::param::FLOOR;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three effects of the intro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CueKind {
    /// Filtered noise fly-by panning across the stereo field
    NoiseSweep,
    /// Falling whistle
    ToneSweep,
    /// Low-frequency impact
    ImpactBoom,
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CueKind::NoiseSweep => "noise-sweep",
            CueKind::ToneSweep => "tone-sweep",
            CueKind::ImpactBoom => "impact-boom",
        };
        f.write_str(name)
    }
}

/// Jet fly-by: low-passed noise whose cutoff peaks as the jet passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSweepParams {
    /// Noise buffer length and envelope duration (seconds)
    pub duration: f64,
    pub filter_start_hz: f32,
    pub filter_peak_hz: f32,
    pub filter_end_hz: f32,
    /// Fraction of `duration` at which the cutoff peaks (closest pass)
    pub peak_fraction: f64,
    pub filter_q: f32,
    pub peak_gain: f32,
    /// Fraction of `duration` spent fading in
    pub fade_in_fraction: f64,
    pub pan_from: f32,
    pub pan_to: f32,
    /// Fraction of `duration` the pan sweep takes; the position holds afterwards
    pub pan_fraction: f64,
    /// Fixed noise seed for reproducible renders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for NoiseSweepParams {
    fn default() -> Self {
        Self {
            duration: 2.5,
            filter_start_hz: 200.0,
            filter_peak_hz: 4000.0,
            filter_end_hz: 100.0,
            peak_fraction: 0.48,
            filter_q: biquad::Q_BUTTERWORTH_F32,
            peak_gain: 0.4,
            fade_in_fraction: 0.4,
            pan_from: -1.0,
            pan_to: 1.0,
            pan_fraction: 0.8,
            seed: None,
        }
    }
}

impl NoiseSweepParams {
    pub fn validate(&self) -> Result<()> {
        check_duration("noise sweep duration", self.duration)?;
        check_hz("noise sweep filter start", self.filter_start_hz)?;
        check_hz("noise sweep filter peak", self.filter_peak_hz)?;
        check_hz("noise sweep filter end", self.filter_end_hz)?;
        check_fraction("noise sweep peak fraction", self.peak_fraction)?;
        check_fraction("noise sweep fade-in fraction", self.fade_in_fraction)?;
        check_fraction("noise sweep pan fraction", self.pan_fraction)?;
        check_peak_gain("noise sweep", self.peak_gain)?;
        check_pan("noise sweep pan_from", self.pan_from)?;
        check_pan("noise sweep pan_to", self.pan_to)?;
        if !(self.filter_q.is_finite() && self.filter_q > 0.0) {
            return Err(FlypastError::InvalidCue(format!(
                "noise sweep filter Q must be positive, got {}",
                self.filter_q
            )));
        }
        Ok(())
    }
}

/// Falling whistle: pitch drops exponentially while the level fades out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneSweepParams {
    pub duration: f64,
    pub start_hz: f32,
    pub end_hz: f32,
    /// Constant starting level, ramped linearly to zero
    pub gain: f32,
    pub waveform: Waveform,
}

impl Default for ToneSweepParams {
    fn default() -> Self {
        Self {
            duration: 0.6,
            start_hz: 1200.0,
            end_hz: 100.0,
            gain: 0.1,
            waveform: Waveform::Sine,
        }
    }
}

impl ToneSweepParams {
    pub fn validate(&self) -> Result<()> {
        check_duration("tone sweep duration", self.duration)?;
        check_hz("tone sweep start", self.start_hz)?;
        check_hz("tone sweep end", self.end_hz)?;
        check_peak_gain("tone sweep", self.gain)
    }
}

/// Impact: a low sine diving towards sub-audio with a long decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactBoomParams {
    /// Duration of the pitch dive (seconds)
    pub sweep_duration: f64,
    /// Duration of the gain decay (seconds)
    pub decay_duration: f64,
    pub start_hz: f32,
    pub end_hz: f32,
    pub peak_gain: f32,
    pub waveform: Waveform,
}

impl Default for ImpactBoomParams {
    fn default() -> Self {
        Self {
            sweep_duration: 0.5,
            decay_duration: 1.0,
            start_hz: 100.0,
            end_hz: FLOOR,
            peak_gain: 0.8,
            waveform: Waveform::Sine,
        }
    }
}

impl ImpactBoomParams {
    pub fn validate(&self) -> Result<()> {
        check_duration("impact sweep duration", self.sweep_duration)?;
        check_duration("impact decay duration", self.decay_duration)?;
        check_hz("impact start", self.start_hz)?;
        check_hz("impact end", self.end_hz)?;
        check_peak_gain("impact", self.peak_gain)
    }
}

/// Parameter set of a cue; the variant decides which graph gets built
#[derive(Debug, Clone, PartialEq)]
pub enum CueEffect {
    NoiseSweep(NoiseSweepParams),
    ToneSweep(ToneSweepParams),
    ImpactBoom(ImpactBoomParams),
}

impl CueEffect {
    pub fn kind(&self) -> CueKind {
        match self {
            CueEffect::NoiseSweep(_) => CueKind::NoiseSweep,
            CueEffect::ToneSweep(_) => CueKind::ToneSweep,
            CueEffect::ImpactBoom(_) => CueKind::ImpactBoom,
        }
    }

    /// Time from start until the voice finishes (seconds)
    pub fn duration(&self) -> f64 {
        match self {
            CueEffect::NoiseSweep(p) => p.duration,
            CueEffect::ToneSweep(p) => p.duration,
            CueEffect::ImpactBoom(p) => p.sweep_duration.max(p.decay_duration),
        }
    }

    /// Level the gain envelope settles at when the voice ends
    ///
    /// Exponential envelopes stop at [`FLOOR`]; the linear whistle fade
    /// reaches zero.
    pub fn gain_floor(&self) -> f32 {
        match self {
            CueEffect::ToneSweep(_) => 0.0,
            CueEffect::NoiseSweep(_) | CueEffect::ImpactBoom(_) => FLOOR,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            CueEffect::NoiseSweep(p) => p.validate(),
            CueEffect::ToneSweep(p) => p.validate(),
            CueEffect::ImpactBoom(p) => p.validate(),
        }
    }
}

/// A cue template: which effect, and when relative to sequence start
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCue {
    /// Seconds from sequence start
    pub offset: f64,
    pub effect: CueEffect,
}

impl AudioCue {
    pub fn new(offset: f64, effect: CueEffect) -> Self {
        Self { offset, effect }
    }

    pub fn kind(&self) -> CueKind {
        self.effect.kind()
    }
}

/// Parameter sets for the three cues
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    pub noise: NoiseSweepParams,
    pub tone: ToneSweepParams,
    pub boom: ImpactBoomParams,
}

impl CueConfig {
    pub fn validate(&self) -> Result<()> {
        self.noise.validate()?;
        self.tone.validate()?;
        self.boom.validate()
    }
}

fn check_duration(what: &str, secs: f64) -> Result<()> {
    if secs.is_finite() && secs > 0.0 {
        Ok(())
    } else {
        Err(FlypastError::InvalidCue(format!("{what} must be positive, got {secs}")))
    }
}

fn check_hz(what: &str, hz: f32) -> Result<()> {
    if hz.is_finite() && hz > 0.0 {
        Ok(())
    } else {
        Err(FlypastError::InvalidCue(format!("{what} frequency must be positive, got {hz}")))
    }
}

fn check_fraction(what: &str, fraction: f64) -> Result<()> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(FlypastError::InvalidCue(format!(
            "{what} must lie strictly between 0 and 1, got {fraction}"
        )))
    }
}

fn check_peak_gain(what: &str, gain: f32) -> Result<()> {
    // The envelope has to fall to the floor, so it must start above it
    if gain.is_finite() && gain > FLOOR && gain <= 1.0 {
        Ok(())
    } else {
        Err(FlypastError::InvalidCue(format!(
            "{what} gain must be in ({FLOOR}, 1.0], got {gain}"
        )))
    }
}

fn check_pan(what: &str, pan: f32) -> Result<()> {
    if (-1.0..=1.0).contains(&pan) {
        Ok(())
    } else {
        Err(FlypastError::InvalidCue(format!("{what} must be in [-1, 1], got {pan}")))
    }
}
