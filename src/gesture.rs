//! Converts raw scroll samples into signed switch distances.
//!
//! Discrete wheel clicks map straight to one step.  Continuous (smooth)
//! deltas are accumulated per axis and emit one step every time the
//! accumulated value reaches the device's resistance; the remainder is kept
//! for the next sample.
//!
//! # Sign convention
//!
//! `Up` and `Left` are negative (towards the previous item), `Down` and
//! `Right` are positive.  Smooth deltas follow the same convention: a
//! positive `dy` scrolls down.

use crate::command::{DeviceId, ScrollKind, ScrollSample};
use crate::device::{AxisMode, DeviceRule, MAX_TRACKED_DEVICES};
use log::{debug, trace};
use std::collections::HashMap;

/// Per-action scaling of continuous deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multipliers {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            horizontal: 1.0,
            vertical: 1.0,
        }
    }
}

/// Fractional scroll carried between samples of one device.
///
/// Each residual stays strictly inside `(-resistance, resistance)` of the
/// rule that last touched it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccumulatorState {
    pub residual_x: f64,
    pub residual_y: f64,
}

impl AccumulatorState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drain whole steps out of `residual`, returning their signed count.
///
/// The count saturates at the `i32` range.  A non-finite residual is
/// dropped without emitting anything.
fn drain_steps(residual: &mut f64, resistance: f64) -> i32 {
    if !residual.is_finite() {
        *residual = 0.0;
        return 0;
    }
    // `%` keeps the sign of the dividend and is exact, so the remainder
    // always lies strictly inside (-resistance, resistance).
    let remainder = *residual % resistance;
    let steps = ((*residual - remainder) / resistance).round();
    *residual = remainder;
    steps.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Scale a raw delta by the axis mode and multiplier, treating non-finite
/// input as no movement.
fn scaled(delta: f64, mode: AxisMode, multiplier: f64) -> f64 {
    let v = delta * mode.sign() * multiplier;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Turn one sample into a switch distance.
///
/// Emulated samples and [`ScrollKind::Unknown`] return `0` and leave
/// `state` untouched.  Discrete kinds return a signed unit (or `0` for a
/// disabled axis) without consulting resistance.  Smooth samples feed the
/// residuals; if both axes emit in the same call only the axis with the
/// larger raw delta counts (horizontal on a tie).
pub fn classify(
    sample: &ScrollSample,
    rule: &DeviceRule,
    multipliers: Multipliers,
    state: &mut AccumulatorState,
) -> i32 {
    if sample.emulated {
        trace!("ignoring pointer-emulated sample from {}", sample.device);
        return 0;
    }
    match sample.kind {
        ScrollKind::Up => rule.vertical.unit(-1),
        ScrollKind::Down => rule.vertical.unit(1),
        ScrollKind::Left => rule.horizontal.unit(-1),
        ScrollKind::Right => rule.horizontal.unit(1),
        ScrollKind::Unknown => 0,
        ScrollKind::Smooth { dx, dy } => {
            if !rule.has_valid_resistance() {
                debug!(
                    "rule for {} has resistance {}, dropping smooth sample",
                    sample.device, rule.resistance
                );
                return 0;
            }
            state.residual_x += scaled(dx, rule.horizontal, multipliers.horizontal);
            state.residual_y += scaled(dy, rule.vertical, multipliers.vertical);
            let steps_x = drain_steps(&mut state.residual_x, rule.resistance);
            let steps_y = drain_steps(&mut state.residual_y, rule.resistance);
            match (steps_x, steps_y) {
                (0, y) => y,
                (x, 0) => x,
                (x, y) => {
                    if dx.abs() >= dy.abs() {
                        x
                    } else {
                        y
                    }
                }
            }
        }
    }
}
/// Accumulator states of one bound region, one per source device.
///
/// States are created on the first sample from a device and live until
/// [`reset`](GestureAccumulator::reset).  At most [`MAX_TRACKED_DEVICES`]
/// are kept; a new device beyond that drops all of them.
#[derive(Debug, Default)]
pub struct GestureAccumulator {
    states: HashMap<DeviceId, AccumulatorState>,
}

impl GestureAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `sample` against `rule`, using the state kept for its device.
    pub fn feed(
        &mut self,
        sample: &ScrollSample,
        rule: &DeviceRule,
        multipliers: Multipliers,
    ) -> i32 {
        if sample.emulated {
            return classify(sample, rule, multipliers, &mut AccumulatorState::default());
        }
        if self.states.len() >= MAX_TRACKED_DEVICES && !self.states.contains_key(&sample.device) {
            debug!("{} devices tracked, dropping accumulated scroll", self.states.len());
            self.states.clear();
        }
        let state = self.states.entry(sample.device.clone()).or_default();
        classify(sample, rule, multipliers, state)
    }

    /// Current state for `device`, if one was created.
    pub fn state(&self, device: &DeviceId) -> Option<&AccumulatorState> {
        self.states.get(device)
    }

    /// Forget all accumulated scroll.
    pub fn reset(&mut self) {
        self.states.clear();
    }
}
