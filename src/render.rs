//! Offline rendering of the intro
//!
//! Plays a timeline into an [`OfflineContext`] and writes the result as
//! a 16-bit stereo WAV file.

use crate::config::FlypastConfig;
use crate::context::OfflineContext;
use crate::error::Result;
use crate::synth::ToneSynthesizer;
use crate::timeline::{PhaseTimeline, TimelineAction};
use std::path::Path;
use tracing::{debug, info};

/// Configuration for rendering audio
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Block size for processing
    pub block_size: usize,
    /// Output gain (0.0 to 1.0)
    pub master_gain: f32,
    /// Keep rendering past completion until every voice has finished.
    /// Live playback releases the audio context at completion, cutting
    /// any voice still sounding.
    pub include_tail: bool,
    /// Fade out time in seconds, applied at the cut
    pub fade_out: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 512,
            master_gain: 1.0,
            include_tail: false,
            fade_out: 0.01,
        }
    }
}

impl RenderConfig {
    pub fn from_config(config: &FlypastConfig) -> Self {
        Self {
            sample_rate: config.audio.sample_rate,
            block_size: config.audio.block_size,
            master_gain: config.audio.master_gain,
            ..Default::default()
        }
    }
}

/// Rendered stereo audio
#[derive(Debug, Clone)]
pub struct RenderedAudio {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl RenderedAudio {
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Frames between `from` and `to` seconds, clamped to the buffer
    pub fn window(&self, from: f64, to: f64) -> (&[f32], &[f32]) {
        let sr = self.sample_rate as f64;
        let start = ((from * sr) as usize).min(self.frames());
        let end = ((to * sr) as usize).clamp(start, self.frames());
        (&self.left[start..end], &self.right[start..end])
    }
}

/// Renders a timeline's cues offline
pub struct SequenceRenderer {
    config: RenderConfig,
    synth: ToneSynthesizer,
}

impl SequenceRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            synth: ToneSynthesizer::new(),
        }
    }

    /// Render to memory
    pub fn render_to_buffer(&self, timeline: &PhaseTimeline) -> Result<RenderedAudio> {
        let sample_rate = self.config.sample_rate;
        let mut ctx = OfflineContext::new(sample_rate as f32, self.config.master_gain);

        let mut end = timeline.total_duration();
        for entry in timeline.entries() {
            if let TimelineAction::FireCue(cue) = &entry.action {
                let handle = self.synth.build(&mut ctx, &cue.effect, entry.offset)?;
                debug!(
                    "Rendered cue {} over {:.3}s -> {:.3}s",
                    handle.kind, handle.start_time, handle.end_time
                );
                if self.config.include_tail {
                    end = end.max(handle.end_time);
                }
            }
        }

        let (mut left, mut right) = ctx.render_until(end, self.config.block_size);
        self.apply_fade_out(&mut left);
        self.apply_fade_out(&mut right);

        Ok(RenderedAudio {
            sample_rate,
            left,
            right,
        })
    }

    /// Render to a WAV file
    pub fn render_to_file(&self, timeline: &PhaseTimeline, output_path: &Path) -> Result<RenderStats> {
        let audio = self.render_to_buffer(timeline)?;
        let stats = RenderStats::from_audio(&audio);
        write_wav(output_path, &audio)?;
        info!(
            "Rendered {:.2}s to {}",
            audio.duration(),
            output_path.display()
        );
        Ok(stats)
    }

    fn apply_fade_out(&self, samples: &mut [f32]) {
        if self.config.fade_out <= 0.0 {
            return;
        }
        let fade_out_samples =
            ((self.config.fade_out * self.config.sample_rate as f32) as usize).min(samples.len());
        let start = samples.len() - fade_out_samples;
        for (i, sample) in samples[start..].iter_mut().enumerate() {
            *sample *= 1.0 - (i as f32 / fade_out_samples as f32);
        }
    }
}

/// Write 16-bit interleaved stereo
fn write_wav(path: &Path, audio: &RenderedAudio) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for (&l, &r) in audio.left.iter().zip(audio.right.iter()) {
        // Clamp to prevent overflow
        writer.write_sample((l.clamp(-1.0, 1.0) * 32767.0) as i16)?;
        writer.write_sample((r.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Statistics about rendered audio
#[derive(Debug, Clone)]
pub struct RenderStats {
    pub duration: f64,
    pub frames: usize,
    pub rms: f32,
    pub left_rms: f32,
    pub right_rms: f32,
    pub peak: f32,
    pub dc_offset: f32,
}

impl RenderStats {
    pub fn from_audio(audio: &RenderedAudio) -> Self {
        let left_rms = rms(&audio.left);
        let right_rms = rms(&audio.right);

        let peak = audio
            .left
            .iter()
            .chain(audio.right.iter())
            .map(|x| x.abs())
            .fold(0.0f32, f32::max);

        let count = (audio.left.len() + audio.right.len()).max(1);
        let dc_offset = audio.left.iter().chain(audio.right.iter()).sum::<f32>() / count as f32;

        Self {
            duration: audio.duration(),
            frames: audio.frames(),
            rms: ((left_rms * left_rms + right_rms * right_rms) / 2.0).sqrt(),
            left_rms,
            right_rms,
            peak,
            dc_offset,
        }
    }

    pub fn print_summary(&self) {
        println!("Render Statistics:");
        println!("  Duration:       {:.3} seconds", self.duration);
        println!("  Frames:         {}", self.frames);
        println!("  RMS:            {:.3} (L {:.3} / R {:.3})", self.rms, self.left_rms, self.right_rms);
        println!("  Peak:           {:.3}", self.peak);
        println!("  DC Offset:      {:.6}", self.dc_offset);
    }
}

/// Root mean square of a channel (0.0 when empty)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|x| x * x).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(include_tail: bool) -> SequenceRenderer {
        SequenceRenderer::new(RenderConfig {
            sample_rate: 8000,
            include_tail,
            ..Default::default()
        })
    }

    #[test]
    fn test_render_stops_at_completion() {
        let audio = renderer(false)
            .render_to_buffer(&PhaseTimeline::reference())
            .unwrap();
        assert_eq!(audio.frames(), (2.4f64 * 8000.0).ceil() as usize);
        assert_eq!(audio.left.len(), audio.right.len());
    }

    #[test]
    fn test_tail_runs_until_last_voice_ends() {
        // Boom starts at 1.6 and decays for 1.0s
        let audio = renderer(true)
            .render_to_buffer(&PhaseTimeline::reference())
            .unwrap();
        assert!((audio.duration() - 2.6).abs() < 0.001);
    }

    #[test]
    fn test_render_is_audible_and_bounded() {
        let audio = renderer(false)
            .render_to_buffer(&PhaseTimeline::reference())
            .unwrap();
        let stats = RenderStats::from_audio(&audio);

        assert!(stats.rms > 0.01, "Render should not be silent");
        assert!(stats.peak <= 1.0);
        assert!(audio.left.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_fade_out_reaches_silence() {
        let audio = renderer(false)
            .render_to_buffer(&PhaseTimeline::reference())
            .unwrap();
        assert!(audio.left.last().unwrap().abs() < 0.02);
        assert!(audio.right.last().unwrap().abs() < 0.02);
    }

    #[test]
    fn test_rms_of_empty_is_zero() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[1.0, -1.0]) - 1.0).abs() < 1e-6);
    }
}
