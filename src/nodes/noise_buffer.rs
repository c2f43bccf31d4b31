/// Noise buffer source - white noise played once from a pre-generated buffer
///
/// The buffer is filled at construction with uniformly distributed values in
/// [-1, 1). Playback starts at the first processed frame and outputs silence
/// once the buffer is exhausted.
use crate::audio_node::{AudioNode, ProcessContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One-shot white noise buffer source
pub struct NoiseBufferNode {
    buffer: Vec<f32>,
    position: usize,
    sample_rate: f32,
}

impl NoiseBufferNode {
    /// NoiseBufferNode - broadband noise of a fixed duration
    ///
    /// # Parameters
    /// - `duration`: Buffer length in seconds
    /// - `sample_rate`: Rate the buffer is generated at
    pub fn new(duration: f64, sample_rate: f32) -> Self {
        Self::generate(duration, sample_rate, &mut StdRng::from_entropy())
    }

    /// Create a noise buffer with a specific seed (for testing)
    pub fn new_with_seed(duration: f64, sample_rate: f32, seed: u64) -> Self {
        Self::generate(duration, sample_rate, &mut StdRng::seed_from_u64(seed))
    }

    fn generate(duration: f64, sample_rate: f32, rng: &mut StdRng) -> Self {
        let frames = (duration.max(0.0) * sample_rate as f64) as usize;
        let buffer = (0..frames).map(|_| rng.gen_range(-1.0..1.0)).collect();

        Self {
            buffer,
            position: 0,
            sample_rate,
        }
    }

    /// Frames left to play
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn samples(&self) -> &[f32] {
        &self.buffer
    }
}

impl AudioNode for NoiseBufferNode {
    fn process_block(&mut self, _input: &[f32], output: &mut [f32], _context: &ProcessContext) {
        let available = self.remaining().min(output.len());
        output[..available].copy_from_slice(&self.buffer[self.position..self.position + available]);
        output[available..].fill(0.0);
        self.position += available;
    }

    fn name(&self) -> &str {
        "NoiseBufferNode"
    }

    fn length(&self) -> Option<f64> {
        Some(self.buffer.len() as f64 / self.sample_rate as f64)
    }
}
