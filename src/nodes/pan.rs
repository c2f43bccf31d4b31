/// Stereo panner node - equal-power panning of a mono signal
///
/// Pan values range from -1.0 (full left) to 1.0 (full right).
/// Center position (0.0) distributes signal equally to both channels.
///
/// Equal-power law ensures constant perceived loudness across pan positions:
/// - pan_angle = (pan + 1.0) * PI / 4.0
/// - left = input * cos(pan_angle)
/// - right = input * sin(pan_angle)

use crate::audio_node::ProcessContext;
use crate::param::AudioParam;
use std::f32::consts::FRAC_PI_4;

/// Mono-to-stereo panner with automated position
///
/// Unlike the other nodes this one has two outputs, so it is not an
/// `AudioNode`; the graph calls [`StereoPannerNode::process_stereo`].
pub struct StereoPannerNode {
    pan: AudioParam,
    pan_buffer: Vec<f32>,
}

impl StereoPannerNode {
    pub fn new(pan: AudioParam) -> Self {
        Self {
            pan,
            pan_buffer: Vec::new(),
        }
    }

    /// Pan position automation
    pub fn position(&self) -> &AudioParam {
        &self.pan
    }

    /// Pan `input` and ADD the result into `left` and `right`
    pub fn process_stereo(
        &mut self,
        input: &[f32],
        left: &mut [f32],
        right: &mut [f32],
        context: &ProcessContext,
    ) {
        debug_assert_eq!(input.len(), left.len(), "Left buffer length mismatch");
        debug_assert_eq!(input.len(), right.len(), "Right buffer length mismatch");

        self.pan_buffer.resize(input.len(), 0.0);
        self.pan
            .fill_block(context.block_start_time, context.sample_rate, &mut self.pan_buffer);

        for i in 0..input.len() {
            let (left_gain, right_gain) = pan_gains(self.pan_buffer[i]);
            left[i] += input[i] * left_gain;
            right[i] += input[i] * right_gain;
        }
    }
}

/// Equal-power channel gains for a pan position
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_left_and_right() {
        let (l, r) = pan_gains(-1.0);
        assert!((l - 1.0).abs() < 1e-6 && r.abs() < 1e-6);

        let (l, r) = pan_gains(1.0);
        assert!(l.abs() < 1e-6 && (r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_center_is_equal_power() {
        let (l, r) = pan_gains(0.0);
        assert!((l - r).abs() < 1e-6);
        assert!((l * l + r * r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(pan_gains(-3.0), pan_gains(-1.0));
        assert_eq!(pan_gains(2.0), pan_gains(1.0));
    }

    #[test]
    fn test_sweep_moves_signal_left_to_right() {
        let mut pan = AudioParam::new(-1.0);
        pan.set_value_at_time(-1.0, 0.0).unwrap();
        pan.linear_ramp_to_value_at_time(1.0, 1.0).unwrap();
        let mut node = StereoPannerNode::new(pan);

        let frames = 101;
        let ctx = ProcessContext::new(0.0, 100.0, frames);
        let input = vec![1.0; frames];
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        node.process_stereo(&input, &mut left, &mut right, &ctx);

        assert!(left[0] > 0.99 && right[0] < 0.01);
        assert!((left[50] - right[50]).abs() < 0.01);
        assert!(left[100] < 0.01 && right[100] > 0.99);
    }

    #[test]
    fn test_output_is_accumulated() {
        let mut node = StereoPannerNode::new(AudioParam::new(0.0));
        let ctx = ProcessContext::new(0.0, 100.0, 2);
        let mut left = vec![1.0; 2];
        let mut right = vec![1.0; 2];
        node.process_stereo(&[1.0, 1.0], &mut left, &mut right, &ctx);

        let (l, r) = pan_gains(0.0);
        assert!((left[0] - (1.0 + l)).abs() < 1e-6);
        assert!((right[1] - (1.0 + r)).abs() < 1e-6);
    }
}
