/// Oscillator node - generates waveforms (sine, saw, square, triangle)
///
/// Stateful (phase tracking) source whose frequency follows an
/// `AudioParam`, so sweeps are evaluated per frame on the context clock.

use crate::audio_node::{AudioNode, ProcessContext};
use crate::param::AudioParam;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
    Triangle,
}

/// Oscillator node with automated frequency
pub struct OscillatorNode {
    frequency: AudioParam,
    waveform: Waveform,
    phase: f32,           // Internal state (0.0 to 1.0)
    freq_buffer: Vec<f32>,
}

impl OscillatorNode {
    /// OscillatorNode - periodic waveform with phase tracking
    ///
    /// # Parameters
    /// - `frequency`: Frequency automation in Hz
    /// - `waveform`: Waveform type (Sine, Saw, Square, Triangle)
    pub fn new(frequency: AudioParam, waveform: Waveform) -> Self {
        Self {
            frequency,
            waveform,
            phase: 0.0,
            freq_buffer: Vec::new(),
        }
    }

    /// Get current phase (0.0 to 1.0)
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> &AudioParam {
        &self.frequency
    }
}

impl AudioNode for OscillatorNode {
    fn process_block(&mut self, _input: &[f32], output: &mut [f32], context: &ProcessContext) {
        self.freq_buffer.resize(output.len(), 0.0);
        self.frequency
            .fill_block(context.block_start_time, context.sample_rate, &mut self.freq_buffer);

        for (sample, &freq) in output.iter_mut().zip(self.freq_buffer.iter()) {
            *sample = match self.waveform {
                Waveform::Sine => (self.phase * 2.0 * PI).sin(),

                Waveform::Saw => 2.0 * self.phase - 1.0,

                Waveform::Square => {
                    if self.phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }

                Waveform::Triangle => {
                    if self.phase < 0.5 {
                        4.0 * self.phase - 1.0
                    } else {
                        -4.0 * self.phase + 3.0
                    }
                }
            };

            // Advance and wrap phase to [0.0, 1.0)
            self.phase = (self.phase + freq / context.sample_rate).rem_euclid(1.0);
        }
    }

    fn name(&self) -> &str {
        "OscillatorNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_zero_crossings(buffer: &[f32]) -> usize {
        buffer
            .windows(2)
            .filter(|w| (w[0] < 0.0 && w[1] >= 0.0) || (w[0] >= 0.0 && w[1] < 0.0))
            .count()
    }

    #[test]
    fn test_sine_frequency_from_zero_crossings() {
        let mut freq = AudioParam::new(440.0);
        freq.set_value_at_time(440.0, 0.0).unwrap();
        let mut osc = OscillatorNode::new(freq, Waveform::Sine);

        let ctx = ProcessContext::new(0.0, 44100.0, 44100);
        let mut out = vec![0.0; 44100];
        osc.process_block(&[], &mut out, &ctx);

        // Two crossings per period
        let crossings = count_zero_crossings(&out);
        assert!((crossings as i32 - 880).abs() <= 2, "got {} crossings", crossings);
        assert!(out.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_frequency_sweep_slows_down() {
        let mut freq = AudioParam::new(1200.0);
        freq.set_value_at_time(1200.0, 0.0).unwrap();
        freq.exponential_ramp_to_value_at_time(100.0, 0.6).unwrap();
        let mut osc = OscillatorNode::new(freq, Waveform::Sine);

        let sr = 44100.0;
        let frames = (0.6 * sr) as usize;
        let ctx = ProcessContext::new(0.0, sr, frames);
        let mut out = vec![0.0; frames];
        osc.process_block(&[], &mut out, &ctx);

        let window = frames / 6;
        let early = count_zero_crossings(&out[..window]);
        let late = count_zero_crossings(&out[frames - window..]);
        assert!(
            early > late * 3,
            "Falling sweep should cross zero far more early ({}) than late ({})",
            early,
            late
        );
    }

    #[test]
    fn test_square_is_bipolar() {
        let osc_freq = AudioParam::new(100.0);
        let mut osc = OscillatorNode::new(osc_freq, Waveform::Square);
        let ctx = ProcessContext::new(0.0, 1000.0, 100);
        let mut out = vec![0.0; 100];
        osc.process_block(&[], &mut out, &ctx);

        assert!(out.iter().all(|&s| s == 1.0 || s == -1.0));
        assert_eq!(osc.waveform(), Waveform::Square);
    }
}
