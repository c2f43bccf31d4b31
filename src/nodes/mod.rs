/// Audio node implementations for cue graphs
///
/// # Node Categories
///
/// ## Source Nodes (no inputs)
/// - [`noise_buffer::NoiseBufferNode`] - Pre-generated buffer of uniform white noise
/// - [`oscillator::OscillatorNode`] - Periodic waveform with automated frequency
///
/// ## Filter Nodes (shape audio)
/// - [`lowpass_filter::LowPassFilterNode`] - 2nd-order low-pass with automated cutoff
///
/// ## Amplitude Nodes
/// - [`gain::GainNode`] - Automated gain envelope
///
/// ## Spatial Nodes
/// - [`pan::StereoPannerNode`] - Equal-power mono-to-stereo panner with automated position
pub mod gain;
pub mod lowpass_filter;
pub mod noise_buffer;
pub mod oscillator;
pub mod pan;

pub use gain::GainNode;
pub use lowpass_filter::LowPassFilterNode;
pub use noise_buffer::NoiseBufferNode;
pub use oscillator::{OscillatorNode, Waveform};
pub use pan::StereoPannerNode;
