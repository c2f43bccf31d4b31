/// Block-based audio processing - core abstraction for cue graphs
///
/// Every node in a voice graph implements `AudioNode`. Nodes process a
/// whole block at once; parameters are automated on the audio context
/// clock, so each block carries the context time of its first frame.

/// Context passed to all nodes during block processing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    /// Context time (seconds) of the first frame in the block
    pub block_start_time: f64,

    /// Sample rate (usually 44100.0 or 48000.0 Hz)
    pub sample_rate: f32,

    /// Number of frames to process in this block
    pub block_size: usize,
}

impl ProcessContext {
    pub fn new(block_start_time: f64, sample_rate: f32, block_size: usize) -> Self {
        Self {
            block_start_time,
            sample_rate,
            block_size,
        }
    }

    /// Context time of a frame within the block
    pub fn time_at_offset(&self, offset: usize) -> f64 {
        self.block_start_time + offset as f64 / self.sample_rate as f64
    }
}

/// Core trait for block-based audio processing
///
/// Source nodes ignore `input` (it is empty). Processing nodes read
/// `input` and write the same number of frames to `output`.
pub trait AudioNode: Send {
    /// Process an entire block of audio
    ///
    /// # Arguments
    /// * `input` - Upstream block (empty for sources)
    /// * `output` - Output buffer (length = `context.block_size`)
    /// * `context` - Block timing (context clock, sample rate)
    fn process_block(&mut self, input: &[f32], output: &mut [f32], context: &ProcessContext);

    /// Get a human-readable name for this node (for debugging)
    fn name(&self) -> &str {
        "AudioNode"
    }

    /// Playable length in seconds for finite sources (buffers)
    ///
    /// `None` means the node runs until its graph is retired.
    fn length(&self) -> Option<f64> {
        None
    }
}
