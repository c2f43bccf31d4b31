//! Declarative phase timeline
//!
//! The single table of "what happens when": phase changes, cue firings
//! and completion, each at an offset (seconds) from sequence start.
//! The scheduler consumes it; nothing else holds timing constants.

use crate::cue::{AudioCue, CueConfig, CueEffect};
use crate::error::{FlypastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual phase of the intro. Ordered: a sequence only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Idle,
    /// Jet approaching, fly-by noise starts
    Approaching,
    /// Jet overhead, capsule dropping
    InFlight,
    Impact,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Approaching => "approaching",
            Phase::InFlight => "in-flight",
            Phase::Impact => "impact",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineAction {
    SetPhase(Phase),
    FireCue(AudioCue),
    /// End of sequence: completion notification and teardown
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub offset: f64,
    pub action: TimelineAction,
}

impl TimelineEntry {
    pub fn phase(offset: f64, phase: Phase) -> Self {
        Self {
            offset,
            action: TimelineAction::SetPhase(phase),
        }
    }

    /// Fire `effect` at `offset`
    pub fn cue(offset: f64, effect: CueEffect) -> Self {
        Self {
            offset,
            action: TimelineAction::FireCue(AudioCue::new(offset, effect)),
        }
    }

    pub fn complete(offset: f64) -> Self {
        Self {
            offset,
            action: TimelineAction::Complete,
        }
    }
}

/// Actions sharing one offset, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineGroup {
    pub offset: f64,
    pub actions: Vec<TimelineAction>,
}

/// Offsets (seconds from start) of the intro
///
/// The impact boom fires `impact_lead` seconds before the impact visual:
/// the sound lands just ahead of the picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub approach: f64,
    pub in_flight: f64,
    /// Capsule drop; the falling whistle starts here
    pub drop: f64,
    pub impact_lead: f64,
    pub impact_visual: f64,
    pub complete: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            approach: 0.0,
            in_flight: 0.6,
            drop: 1.1,
            impact_lead: 0.1,
            impact_visual: 1.7,
            complete: 2.4,
        }
    }
}

impl TimelineConfig {
    /// Offset of the impact boom
    pub fn boom(&self) -> f64 {
        self.impact_visual - self.impact_lead
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.impact_lead.is_finite() && self.impact_lead >= 0.0) {
            return Err(FlypastError::InvalidTimeline(format!(
                "impact lead must be non-negative, got {}",
                self.impact_lead
            )));
        }
        if self.boom() < self.drop {
            return Err(FlypastError::InvalidTimeline(format!(
                "impact boom at {:.3}s would fire before the drop at {:.3}s",
                self.boom(),
                self.drop
            )));
        }
        // Remaining ordering checks happen on the built table
        Ok(())
    }
}

/// Validated, offset-ordered timeline
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTimeline {
    entries: Vec<TimelineEntry>,
}

impl PhaseTimeline {
    /// Validate and stably sort `entries` by offset
    pub fn new(mut entries: Vec<TimelineEntry>) -> Result<Self> {
        for entry in &entries {
            if !entry.offset.is_finite() || entry.offset < 0.0 {
                return Err(FlypastError::InvalidTimeline(format!(
                    "offset must be finite and non-negative, got {}",
                    entry.offset
                )));
            }
        }

        // Vec::sort_by is stable: ties keep declaration order
        entries.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        let mut last_phase = Phase::Idle;
        let mut completions = 0;
        for entry in &entries {
            match &entry.action {
                TimelineAction::SetPhase(phase @ (Phase::Idle | Phase::Complete)) => {
                    return Err(FlypastError::InvalidTimeline(format!(
                        "phase {phase} cannot be scheduled"
                    )));
                }
                TimelineAction::SetPhase(phase) => {
                    if *phase <= last_phase {
                        return Err(FlypastError::InvalidTimeline(format!(
                            "phase {phase} at {:.3}s does not move forward from {last_phase}",
                            entry.offset
                        )));
                    }
                    last_phase = *phase;
                }
                TimelineAction::FireCue(cue) => {
                    cue.effect.validate()?;
                }
                TimelineAction::Complete => completions += 1,
            }
        }

        if completions != 1 {
            return Err(FlypastError::InvalidTimeline(format!(
                "expected exactly one completion, found {completions}"
            )));
        }
        if !matches!(entries.last(), Some(e) if e.action == TimelineAction::Complete) {
            return Err(FlypastError::InvalidTimeline(
                "completion must be the final entry".into(),
            ));
        }

        Ok(Self { entries })
    }

    /// The intro as shipped
    pub fn reference() -> Self {
        let cues = CueConfig::default();
        let timing = TimelineConfig::default();
        Self {
            entries: reference_entries(&timing, &cues),
        }
    }

    pub fn from_config(timing: &TimelineConfig, cues: &CueConfig) -> Result<Self> {
        timing.validate()?;
        cues.validate()?;
        Self::new(reference_entries(timing, cues))
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Offset of the completion entry
    pub fn total_duration(&self) -> f64 {
        self.entries.last().map(|e| e.offset).unwrap_or(0.0)
    }

    pub fn phase_offsets(&self) -> Vec<(Phase, f64)> {
        self.entries
            .iter()
            .filter_map(|e| match e.action {
                TimelineAction::SetPhase(phase) => Some((phase, e.offset)),
                _ => None,
            })
            .collect()
    }

    pub fn cue_offsets(&self) -> Vec<(crate::cue::CueKind, f64)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.action {
                TimelineAction::FireCue(cue) => Some((cue.kind(), e.offset)),
                _ => None,
            })
            .collect()
    }

    /// Entries grouped by equal offset
    pub fn groups(&self) -> Vec<TimelineGroup> {
        let mut groups: Vec<TimelineGroup> = Vec::new();
        for entry in &self.entries {
            match groups.last_mut() {
                Some(group) if group.offset == entry.offset => {
                    group.actions.push(entry.action.clone());
                }
                _ => groups.push(TimelineGroup {
                    offset: entry.offset,
                    actions: vec![entry.action.clone()],
                }),
            }
        }
        groups
    }
}

impl Default for PhaseTimeline {
    fn default() -> Self {
        Self::reference()
    }
}

impl fmt::Display for PhaseTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let action = match &entry.action {
                TimelineAction::SetPhase(phase) => format!("phase {phase}"),
                TimelineAction::FireCue(cue) => format!("fire {}", cue.kind()),
                TimelineAction::Complete => "complete".to_string(),
            };
            writeln!(f, "{:>6.2}s  {}", entry.offset, action)?;
        }
        Ok(())
    }
}

fn reference_entries(timing: &TimelineConfig, cues: &CueConfig) -> Vec<TimelineEntry> {
    vec![
        TimelineEntry::phase(timing.approach, Phase::Approaching),
        TimelineEntry::cue(timing.approach, CueEffect::NoiseSweep(cues.noise.clone())),
        TimelineEntry::phase(timing.in_flight, Phase::InFlight),
        TimelineEntry::cue(timing.drop, CueEffect::ToneSweep(cues.tone.clone())),
        TimelineEntry::cue(timing.boom(), CueEffect::ImpactBoom(cues.boom.clone())),
        TimelineEntry::phase(timing.impact_visual, Phase::Impact),
        TimelineEntry::complete(timing.complete),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::CueKind;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_offsets() {
        let timeline = PhaseTimeline::reference();

        let phases = timeline.phase_offsets();
        assert_eq!(phases.len(), 3);
        assert_eq!(phases[0], (Phase::Approaching, 0.0));
        assert_eq!(phases[1], (Phase::InFlight, 0.6));
        assert_eq!(phases[2].0, Phase::Impact);
        assert!(approx(phases[2].1, 1.7));

        let cues = timeline.cue_offsets();
        assert_eq!(cues[0], (CueKind::NoiseSweep, 0.0));
        assert_eq!(cues[1], (CueKind::ToneSweep, 1.1));
        assert_eq!(cues[2].0, CueKind::ImpactBoom);
        assert!(approx(cues[2].1, 1.6));

        assert!(approx(timeline.total_duration(), 2.4));
    }

    #[test]
    fn test_reference_matches_validated_config() {
        let built =
            PhaseTimeline::from_config(&TimelineConfig::default(), &CueConfig::default()).unwrap();
        assert_eq!(built, PhaseTimeline::reference());
    }

    #[test]
    fn test_groups_keep_declaration_order() {
        let groups = PhaseTimeline::reference().groups();
        assert_eq!(groups.len(), 6);
        assert_eq!(groups[0].offset, 0.0);
        assert_eq!(groups[0].actions.len(), 2);
        assert_eq!(groups[0].actions[0], TimelineAction::SetPhase(Phase::Approaching));
        assert!(matches!(groups[0].actions[1], TimelineAction::FireCue(_)));
        assert_eq!(groups[5].actions, vec![TimelineAction::Complete]);
    }

    #[test]
    fn test_entries_are_sorted_stably() {
        let timeline = PhaseTimeline::new(vec![
            TimelineEntry::complete(2.0),
            TimelineEntry::phase(1.0, Phase::InFlight),
            TimelineEntry::phase(0.0, Phase::Approaching),
        ])
        .unwrap();
        let offsets: Vec<f64> = timeline.entries().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_rejects_backward_phase() {
        let result = PhaseTimeline::new(vec![
            TimelineEntry::phase(0.0, Phase::Impact),
            TimelineEntry::phase(1.0, Phase::Approaching),
            TimelineEntry::complete(2.0),
        ]);
        assert!(matches!(result, Err(FlypastError::InvalidTimeline(_))));
    }

    #[test]
    fn test_rejects_missing_or_early_completion() {
        assert!(PhaseTimeline::new(vec![TimelineEntry::phase(0.0, Phase::Approaching)]).is_err());
        assert!(PhaseTimeline::new(vec![
            TimelineEntry::complete(1.0),
            TimelineEntry::phase(2.0, Phase::Approaching),
        ])
        .is_err());
        assert!(PhaseTimeline::new(vec![
            TimelineEntry::complete(1.0),
            TimelineEntry::complete(1.0),
        ])
        .is_err());
    }

    #[test]
    fn test_rejects_unschedulable_phases_and_bad_offsets() {
        assert!(PhaseTimeline::new(vec![
            TimelineEntry::phase(0.0, Phase::Idle),
            TimelineEntry::complete(1.0),
        ])
        .is_err());
        assert!(PhaseTimeline::new(vec![
            TimelineEntry::phase(0.0, Phase::Complete),
            TimelineEntry::complete(1.0),
        ])
        .is_err());
        assert!(PhaseTimeline::new(vec![TimelineEntry::complete(-1.0)]).is_err());
        assert!(PhaseTimeline::new(vec![TimelineEntry::complete(f64::NAN)]).is_err());
    }

    #[test]
    fn test_config_rejects_boom_before_drop() {
        let timing = TimelineConfig {
            impact_lead: 1.0,
            ..Default::default()
        };
        assert!(timing.validate().is_err());
    }

    #[test]
    fn test_phase_ordering() {
        assert!(Phase::Idle < Phase::Approaching);
        assert!(Phase::Impact < Phase::Complete);
        assert_eq!(Phase::InFlight.to_string(), "in-flight");
    }
}
