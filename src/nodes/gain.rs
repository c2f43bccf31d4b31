/// Gain node - applies an automated gain envelope to a signal
///
/// output[i] = input[i] * gain(t_i)

use crate::audio_node::{AudioNode, ProcessContext};
use crate::param::AudioParam;

/// Gain node with an automated envelope
pub struct GainNode {
    gain: AudioParam,
    gain_buffer: Vec<f32>,
}

impl GainNode {
    pub fn new(gain: AudioParam) -> Self {
        Self {
            gain,
            gain_buffer: Vec::new(),
        }
    }

    /// The gain envelope
    pub fn envelope(&self) -> &AudioParam {
        &self.gain
    }
}

impl AudioNode for GainNode {
    fn process_block(&mut self, input: &[f32], output: &mut [f32], context: &ProcessContext) {
        debug_assert_eq!(input.len(), output.len(), "Input buffer length mismatch");

        self.gain_buffer.resize(output.len(), 0.0);
        self.gain
            .fill_block(context.block_start_time, context.sample_rate, &mut self.gain_buffer);

        for ((out, &sample), &gain) in output.iter_mut().zip(input).zip(self.gain_buffer.iter()) {
            *out = sample * gain;
        }
    }

    fn name(&self) -> &str {
        "GainNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_follows_envelope() {
        let mut env = AudioParam::new(0.0);
        env.set_value_at_time(0.0, 0.0).unwrap();
        env.linear_ramp_to_value_at_time(1.0, 1.0).unwrap();
        let mut node = GainNode::new(env);

        let ctx = ProcessContext::new(0.0, 10.0, 11);
        let input = vec![2.0; 11];
        let mut out = vec![0.0; 11];
        node.process_block(&input, &mut out, &ctx);

        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[5] - 1.0).abs() < 1e-5);
        assert!((out[10] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_constant_gain() {
        let mut node = GainNode::new(AudioParam::new(0.5));
        let ctx = ProcessContext::new(3.0, 44100.0, 4);
        let mut out = vec![0.0; 4];
        node.process_block(&[1.0, -1.0, 0.5, 0.0], &mut out, &ctx);

        assert_eq!(out, vec![0.5, -0.5, 0.25, 0.0]);
    }
}
