//! Sample-accurate parameter automation
//!
//! An `AudioParam` holds a time-ordered list of automation events on the
//! audio context clock (seconds) and evaluates them per frame. The event
//! model follows the Web Audio `AudioParam` timeline: a ramp runs from
//! the previous event's time and value to its own end time and value.

use crate::error::{FlypastError, Result};

/// Smallest value an exponential ramp may target.
///
/// Exponential curves are undefined at zero, so envelopes that should
/// "fade to nothing" stop here instead.
pub const FLOOR: f32 = 0.01;

/// One scheduled automation event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` at `time`
    SetValue { time: f64, value: f32 },
    /// Ramp linearly from the previous event, arriving at `value` at `end_time`
    LinearRamp { end_time: f64, value: f32 },
    /// Ramp exponentially from the previous event, arriving at `value` at `end_time`
    ExponentialRamp { end_time: f64, value: f32 },
}

impl AutomationEvent {
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } => time,
            AutomationEvent::LinearRamp { end_time, .. } => end_time,
            AutomationEvent::ExponentialRamp { end_time, .. } => end_time,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            AutomationEvent::SetValue { value, .. } => value,
            AutomationEvent::LinearRamp { value, .. } => value,
            AutomationEvent::ExponentialRamp { value, .. } => value,
        }
    }

    fn is_ramp(&self) -> bool {
        !matches!(self, AutomationEvent::SetValue { .. })
    }
}

/// Automated node parameter (frequency, gain, pan position)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    default_value: f32,
    events: Vec<AutomationEvent>,
}

impl AudioParam {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::new(),
        }
    }

    /// Jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> Result<&mut Self> {
        check_time(time)?;
        check_value(value)?;
        self.insert(AutomationEvent::SetValue { time, value });
        Ok(self)
    }

    /// Linear ramp ending at `value` at `end_time`
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) -> Result<&mut Self> {
        check_time(end_time)?;
        check_value(value)?;
        self.insert(AutomationEvent::LinearRamp { end_time, value });
        Ok(self)
    }

    /// Exponential ramp ending at `value` at `end_time`
    ///
    /// `value` must be strictly positive; use [`FLOOR`] for "silence".
    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f32,
        end_time: f64,
    ) -> Result<&mut Self> {
        check_time(end_time)?;
        check_value(value)?;
        if value <= 0.0 {
            return Err(FlypastError::InvalidAutomation(format!(
                "exponential ramp target must be positive, got {value}"
            )));
        }
        self.insert(AutomationEvent::ExponentialRamp { end_time, value });
        Ok(self)
    }

    /// Events sorted by time (ties keep insertion order)
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    pub fn default_value(&self) -> f32 {
        self.default_value
    }

    /// Time of the last scheduled event, if any
    pub fn last_event_time(&self) -> Option<f64> {
        self.events.last().map(AutomationEvent::time)
    }

    /// Value the parameter holds once every event has run
    pub fn final_value(&self) -> f32 {
        self.events
            .last()
            .map(AutomationEvent::value)
            .unwrap_or(self.default_value)
    }

    /// Evaluate the automation at context time `t`
    pub fn value_at(&self, t: f64) -> f32 {
        // events[..idx] have already happened
        let idx = self.events.partition_point(|e| e.time() <= t);

        if let Some(next) = self.events.get(idx) {
            if next.is_ramp() {
                let (t0, v0) = match idx.checked_sub(1).map(|i| self.events[i]) {
                    Some(prev) => (prev.time(), prev.value()),
                    None => (0.0, self.default_value),
                };
                let t1 = next.time();
                let span = t1 - t0;
                if span <= 0.0 {
                    return v0;
                }
                let progress = ((t - t0) / span).clamp(0.0, 1.0);

                return match *next {
                    AutomationEvent::LinearRamp { value, .. } => {
                        v0 + (value - v0) * progress as f32
                    }
                    AutomationEvent::ExponentialRamp { value, .. } => {
                        if v0 <= 0.0 {
                            // Undefined curve: hold until the ramp ends
                            v0
                        } else {
                            let ratio = (value / v0) as f64;
                            (v0 as f64 * ratio.powf(progress)) as f32
                        }
                    }
                    AutomationEvent::SetValue { .. } => unreachable!("checked by is_ramp"),
                };
            }
        }

        match idx.checked_sub(1) {
            Some(i) => self.events[i].value(),
            None => self.default_value,
        }
    }

    /// Write one value per frame, starting at context time `start_time`
    pub fn fill_block(&self, start_time: f64, sample_rate: f32, out: &mut [f32]) {
        if self.events.is_empty() {
            out.fill(self.default_value);
            return;
        }

        let dt = 1.0 / sample_rate as f64;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.value_at(start_time + i as f64 * dt);
        }
    }

    fn insert(&mut self, event: AutomationEvent) {
        let pos = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(pos, event);
    }
}

fn check_time(time: f64) -> Result<()> {
    if !time.is_finite() || time < 0.0 {
        return Err(FlypastError::InvalidAutomation(format!(
            "event time must be finite and non-negative, got {time}"
        )));
    }
    Ok(())
}

fn check_value(value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(FlypastError::InvalidAutomation(format!(
            "event value must be finite, got {value}"
        )));
    }
    Ok(())
}
