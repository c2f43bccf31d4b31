//! Envelope shape checks for every cue builder

use flypast::param::AutomationEvent;
use flypast::synth::{impact_boom_graph, noise_sweep_graph, tone_sweep_graph};
use flypast::{
    AudioParam, CueEffect, ImpactBoomParams, NoiseSweepParams, ToneSweepParams, VoiceGraph, FLOOR,
};

const SAMPLE_RATE: f32 = 8000.0;

fn build(effect: &CueEffect, when: f64) -> VoiceGraph {
    match effect {
        CueEffect::NoiseSweep(p) => noise_sweep_graph(p, SAMPLE_RATE, when),
        CueEffect::ToneSweep(p) => tone_sweep_graph(p, SAMPLE_RATE, when),
        CueEffect::ImpactBoom(p) => impact_boom_graph(p, SAMPLE_RATE, when),
    }
    .expect("valid parameters build")
}

fn sample_effects() -> Vec<CueEffect> {
    vec![
        CueEffect::NoiseSweep(NoiseSweepParams::default()),
        CueEffect::NoiseSweep(NoiseSweepParams {
            duration: 0.8,
            fade_in_fraction: 0.1,
            peak_gain: 1.0,
            ..Default::default()
        }),
        CueEffect::ToneSweep(ToneSweepParams::default()),
        CueEffect::ToneSweep(ToneSweepParams {
            duration: 2.0,
            start_hz: 300.0,
            end_hz: 2000.0,
            gain: 0.5,
            ..Default::default()
        }),
        CueEffect::ImpactBoom(ImpactBoomParams::default()),
        CueEffect::ImpactBoom(ImpactBoomParams {
            sweep_duration: 1.5,
            decay_duration: 0.3,
            ..Default::default()
        }),
    ]
}

/// Time of the highest breakpoint; envelopes are monotone between breakpoints
fn peak_time(envelope: &AudioParam) -> f64 {
    envelope
        .events()
        .iter()
        .fold(None::<AutomationEvent>, |best, e| match best {
            Some(b) if b.value() >= e.value() => Some(b),
            _ => Some(*e),
        })
        .map(|e| e.time())
        .expect("envelope has events")
}

#[test]
fn test_gain_decreases_monotonically_to_floor_after_peak() {
    for when in [0.0, 1.6] {
        for effect in sample_effects() {
            let graph = build(&effect, when);
            let envelope = graph.gain_envelope();
            let end = when + effect.duration();
            let peak_time = peak_time(envelope);

            let steps = 1000;
            let mut previous = f32::MAX;
            for i in 0..=steps {
                let t = peak_time + (end - peak_time) * i as f64 / steps as f64;
                let value = envelope.value_at(t);
                assert!(
                    value <= previous + 1e-6,
                    "{:?} rises after its peak at {t:.3}s",
                    effect.kind()
                );
                previous = value;
            }

            let settled = envelope.value_at(end);
            assert!(
                (settled - effect.gain_floor()).abs() < 1e-4,
                "{:?} settles at {settled}, expected {}",
                effect.kind(),
                effect.gain_floor()
            );
        }
    }
}

#[test]
fn test_no_exponential_ramp_targets_zero() {
    for effect in sample_effects() {
        let graph = build(&effect, 0.3);
        let mut params = vec![graph.gain_envelope()];
        params.extend(graph.pan_automation());

        for param in params {
            for event in param.events() {
                if let AutomationEvent::ExponentialRamp { value, .. } = event {
                    assert!(*value >= FLOOR, "{:?} ramps to {value}", effect.kind());
                }
            }
        }
    }
}

#[test]
fn test_voice_ends_by_declared_duration() {
    for effect in sample_effects() {
        let graph = build(&effect, 1.1);
        assert_eq!(graph.start_time(), 1.1);
        assert!(
            graph.end_time() <= 1.1 + effect.duration() + 1e-9,
            "{:?} outlives its duration",
            effect.kind()
        );
    }
}

#[test]
fn test_builders_never_start_before_when() {
    for effect in sample_effects() {
        let graph = build(&effect, 2.0);
        let envelope = graph.gain_envelope();
        assert!(envelope.events().iter().all(|e| e.time() >= 2.0));
    }
}

#[test]
fn test_invalid_parameter_sets_are_rejected() {
    let bad = [
        CueEffect::NoiseSweep(NoiseSweepParams {
            duration: -1.0,
            ..Default::default()
        }),
        CueEffect::NoiseSweep(NoiseSweepParams {
            pan_from: -2.0,
            ..Default::default()
        }),
        CueEffect::ToneSweep(ToneSweepParams {
            start_hz: f32::NAN,
            ..Default::default()
        }),
        CueEffect::ImpactBoom(ImpactBoomParams {
            end_hz: 0.0,
            ..Default::default()
        }),
    ];

    for effect in bad {
        let result = match &effect {
            CueEffect::NoiseSweep(p) => noise_sweep_graph(p, SAMPLE_RATE, 0.0),
            CueEffect::ToneSweep(p) => tone_sweep_graph(p, SAMPLE_RATE, 0.0),
            CueEffect::ImpactBoom(p) => impact_boom_graph(p, SAMPLE_RATE, 0.0),
        };
        assert!(result.is_err(), "{:?} accepted", effect);
    }
}
