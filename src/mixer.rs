//! Destination mixer shared by every audio context
//!
//! Sums connected voices into a stereo block, advances the context clock
//! by the frames rendered and retires voices that reached their natural
//! end. The device callback and the offline renderer both drive it.

use crate::graph::VoiceGraph;
use tracing::debug;

/// Handle returned when a graph is connected to a destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphHandle {
    pub id: u64,
    pub kind: crate::cue::CueKind,
    pub start_time: f64,
    pub end_time: f64,
}

pub struct Mixer {
    sample_rate: f32,
    master_gain: f32,
    voices: Vec<(u64, VoiceGraph)>,
    frames_rendered: u64,
    next_id: u64,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Mixer {
    pub fn new(sample_rate: f32, master_gain: f32) -> Self {
        Self {
            sample_rate,
            master_gain: master_gain.clamp(0.0, 1.0),
            voices: Vec::new(),
            frames_rendered: 0,
            next_id: 0,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Context clock: seconds of audio rendered so far
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Take ownership of a graph; it plays from its own start time
    pub fn connect(&mut self, graph: VoiceGraph) -> GraphHandle {
        let id = self.next_id;
        self.next_id += 1;

        let handle = GraphHandle {
            id,
            kind: graph.kind(),
            start_time: graph.start_time(),
            end_time: graph.end_time(),
        };
        debug!(
            "Voice {} ({}) connected: {:.3}s -> {:.3}s",
            id, handle.kind, handle.start_time, handle.end_time
        );
        self.voices.push((id, graph));
        handle
    }

    /// Drop every voice (context teardown)
    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Render one stereo block, overwriting `left` and `right`
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        left[..frames].fill(0.0);
        right[..frames].fill(0.0);

        let block_start = self.current_time();
        for (_, voice) in self.voices.iter_mut() {
            voice.render(block_start, self.sample_rate, &mut left[..frames], &mut right[..frames]);
        }

        // Soft clipping to prevent distortion
        for sample in left[..frames].iter_mut().chain(right[..frames].iter_mut()) {
            *sample = (*sample * self.master_gain).tanh();
        }

        self.frames_rendered += frames as u64;

        let now = self.current_time();
        self.voices.retain(|(id, voice)| {
            let keep = !voice.is_finished(now);
            if !keep {
                debug!("Voice {} ({}) finished", id, voice.kind());
            }
            keep
        });
    }

    /// Render into an interleaved device buffer
    ///
    /// Mono devices get the average of both channels; channels past the
    /// second are silent.
    pub fn process_interleaved<T>(&mut self, output: &mut [T], channels: usize)
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = channels.max(1);
        let frames = output.len() / channels;

        let mut left = std::mem::take(&mut self.left);
        let mut right = std::mem::take(&mut self.right);
        left.resize(frames, 0.0);
        right.resize(frames, 0.0);

        self.render(&mut left, &mut right);

        for (i, frame) in output.chunks_mut(channels).enumerate() {
            let (l, r) = if i < frames { (left[i], right[i]) } else { (0.0, 0.0) };
            match frame.len() {
                1 => frame[0] = T::from_sample((l + r) * 0.5),
                _ => {
                    for (c, sample) in frame.iter_mut().enumerate() {
                        *sample = T::from_sample(match c {
                            0 => l,
                            1 => r,
                            _ => 0.0,
                        });
                    }
                }
            }
        }

        self.left = left;
        self.right = right;
    }
}
