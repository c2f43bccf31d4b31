/// Low-pass filter node - uses biquad IIR filtering
///
/// 2nd-order low-pass whose cutoff follows an `AudioParam`.
///
/// # Implementation Details
///
/// Uses biquad::DirectForm2Transposed for efficient IIR filtering with
/// minimal state and good numerical stability.
///
/// Filter coefficients are updated when the cutoff changes by more than
/// 0.1 Hz, so a swept cutoff is tracked per frame without recomputing
/// coefficients on flat stretches.

use crate::audio_node::{AudioNode, ProcessContext};
use crate::param::AudioParam;
use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz};

/// Low-pass filter node with automated cutoff
pub struct LowPassFilterNode {
    /// Cutoff frequency automation (Hz)
    cutoff: AudioParam,
    /// Resonance; 0.707 for Butterworth
    q: f32,
    /// Biquad filter state (maintains filter memory between blocks)
    filter: DirectForm2Transposed<f32>,
    /// Last cutoff value (for detecting changes)
    last_cutoff: f32,
    /// Sample rate the current coefficients were computed for
    last_sample_rate: f32,
    cutoff_buffer: Vec<f32>,
}

impl LowPassFilterNode {
    /// LowPass Filter - attenuates frequencies above the cutoff
    ///
    /// # Parameters
    /// - `cutoff`: Cutoff frequency automation in Hz
    /// - `q`: Resonance factor (clamped to 0.01-20.0)
    pub fn new(cutoff: AudioParam, q: f32) -> Self {
        Self {
            cutoff,
            q: q.clamp(0.01, 20.0),
            filter: DirectForm2Transposed::<f32>::new(passthrough()),
            last_cutoff: f32::NAN,
            last_sample_rate: f32::NAN,
            cutoff_buffer: Vec::new(),
        }
    }

    pub fn cutoff(&self) -> &AudioParam {
        &self.cutoff
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    fn update_coefficients(&mut self, cutoff: f32, sample_rate: f32) {
        // An invalid parameter set keeps the previous coefficients
        if let Ok(coeffs) = Coefficients::<f32>::from_params(
            biquad::Type::LowPass,
            sample_rate.hz(),
            cutoff.hz(),
            self.q,
        ) {
            self.filter.update_coefficients(coeffs);
        }
        self.last_cutoff = cutoff;
        self.last_sample_rate = sample_rate;
    }
}

/// Identity coefficients used until the first block sets real ones
fn passthrough() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

impl AudioNode for LowPassFilterNode {
    fn process_block(&mut self, input: &[f32], output: &mut [f32], context: &ProcessContext) {
        debug_assert_eq!(input.len(), output.len(), "Input buffer length mismatch");

        let sample_rate = context.sample_rate;
        self.cutoff_buffer.resize(output.len(), 0.0);
        self.cutoff
            .fill_block(context.block_start_time, sample_rate, &mut self.cutoff_buffer);

        for i in 0..output.len() {
            let cutoff = self.cutoff_buffer[i].max(10.0).min(sample_rate * 0.49); // Clamp to valid range

            if sample_rate != self.last_sample_rate
                || !((cutoff - self.last_cutoff).abs() <= 0.1)
            {
                self.update_coefficients(cutoff, sample_rate);
            }

            output[i] = self.filter.run(input[i]);
        }
    }

    fn name(&self) -> &str {
        "LowPassFilterNode"
    }
}
