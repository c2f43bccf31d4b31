//! One-shot voice graphs
//!
//! A `VoiceGraph` realizes one fired cue:
//! `source -> [processors] -> gain -> [panner] -> destination`.
//! It renders only between its start time and its natural end, which is
//! the earlier of "gain envelope reached its floor" and "source buffer
//! exhausted". Graphs are never reused.

use crate::audio_node::{AudioNode, ProcessContext};
use crate::cue::CueKind;
use crate::nodes::{GainNode, StereoPannerNode};
use crate::param::AudioParam;

/// Runtime realization of one cue
pub struct VoiceGraph {
    kind: CueKind,
    source: Box<dyn AudioNode>,
    processors: Vec<Box<dyn AudioNode>>,
    gain: GainNode,
    panner: Option<StereoPannerNode>,
    start_time: f64,
    end_time: f64,
    mono: Vec<f32>,
    scratch: Vec<f32>,
}

impl VoiceGraph {
    /// Chain `source -> gain`, starting at `start_time` on the context clock
    pub fn new(kind: CueKind, source: Box<dyn AudioNode>, gain: GainNode, start_time: f64) -> Self {
        let mut graph = Self {
            kind,
            source,
            processors: Vec::new(),
            gain,
            panner: None,
            start_time,
            end_time: start_time,
            mono: Vec::new(),
            scratch: Vec::new(),
        };
        graph.end_time = graph.natural_end();
        graph
    }

    /// Insert a processor between the source and the gain stage
    pub fn with_processor(mut self, node: Box<dyn AudioNode>) -> Self {
        self.processors.push(node);
        self
    }

    /// Route the gain stage through a stereo panner
    pub fn with_panner(mut self, panner: StereoPannerNode) -> Self {
        self.panner = Some(panner);
        self
    }

    pub fn kind(&self) -> CueKind {
        self.kind
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Context time at which the voice stops rendering
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn gain_envelope(&self) -> &AudioParam {
        self.gain.envelope()
    }

    pub fn pan_automation(&self) -> Option<&AudioParam> {
        self.panner.as_ref().map(StereoPannerNode::position)
    }

    /// Node names from source to gain (debugging aid)
    pub fn node_names(&self) -> Vec<String> {
        let mut names = vec![self.source.name().to_string()];
        names.extend(self.processors.iter().map(|p| p.name().to_string()));
        names.push(self.gain.name().to_string());
        if self.panner.is_some() {
            names.push("StereoPannerNode".to_string());
        }
        names
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now >= self.end_time
    }

    /// Render one block starting at context time `block_start_time`, adding into
    /// `left`/`right`. Frames before the start time or at/after the end stay untouched.
    pub fn render(
        &mut self,
        block_start_time: f64,
        sample_rate: f32,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        let frames = left.len().min(right.len());
        let sr = sample_rate as f64;

        let first = if block_start_time >= self.start_time {
            0
        } else {
            frame_index(self.start_time - block_start_time, sr)
        };
        let last = frame_index(self.end_time - block_start_time, sr).min(frames);
        if first >= last {
            return;
        }

        let n = last - first;
        let context = ProcessContext::new(block_start_time + first as f64 / sr, sample_rate, n);

        self.mono.resize(n, 0.0);
        self.scratch.resize(n, 0.0);

        self.source.process_block(&[], &mut self.mono[..n], &context);

        for processor in self.processors.iter_mut() {
            self.scratch[..n].copy_from_slice(&self.mono[..n]);
            processor.process_block(&self.scratch[..n], &mut self.mono[..n], &context);
        }

        self.scratch[..n].copy_from_slice(&self.mono[..n]);
        self.gain
            .process_block(&self.scratch[..n], &mut self.mono[..n], &context);

        match self.panner.as_mut() {
            Some(panner) => panner.process_stereo(
                &self.mono[..n],
                &mut left[first..last],
                &mut right[first..last],
                &context,
            ),
            None => {
                // Mono up-mix: same signal on both channels
                for i in 0..n {
                    left[first + i] += self.mono[i];
                    right[first + i] += self.mono[i];
                }
            }
        }
    }

    fn natural_end(&self) -> f64 {
        let envelope_end = self
            .gain
            .envelope()
            .last_event_time()
            .unwrap_or(self.start_time)
            .max(self.start_time);

        match self.source.length() {
            Some(length) => envelope_end.min(self.start_time + length),
            None => envelope_end,
        }
    }
}

/// First frame at or after `seconds`, tolerating float error in the clock
fn frame_index(seconds: f64, sample_rate: f64) -> usize {
    (seconds * sample_rate - 1e-6).ceil().max(0.0) as usize
}

impl std::fmt::Debug for VoiceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceGraph")
            .field("kind", &self.kind)
            .field("nodes", &self.node_names())
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .finish()
    }
}
