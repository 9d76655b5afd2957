//! Sample-accurate automation timelines.
//!
//! An [`AutomationTimeline`] is the event list behind one interpolated engine
//! parameter. Events are kept sorted by time; interpolation between them is
//! computed on demand by [`value_at`](AutomationTimeline::value_at), which the
//! engine calls once per rendered sample.
//!
//! ## Segment Shapes
//!
//! - **Set**: jump to a value at the event time
//! - **Linear ramp**: straight line from the previous event to the target
//! - **Exponential ramp**: geometric interpolation from the previous event;
//!   if either endpoint is zero or the signs differ, the previous value is held
//!   until the ramp's end time
//! - **Target**: `v(t) = target + (v0 - target)·e^(-(t - t0)/τ)`
//! - **Curve**: linear interpolation across an explicit value array spread
//!   over a duration
//!
//! Before the first event the timeline reports its intrinsic value. A ramp
//! with no preceding event starts from the intrinsic value at time zero.

use libm::{exp, floor, pow};

/// Floor substituted for zero or negative values in exponential-family events.
pub const MIN_OUTPUT: f64 = 1e-5;

/// Shape of one automation event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Jump to the event value.
    Set,
    /// Linear ramp ending at the event.
    LinearRamp,
    /// Exponential ramp ending at the event.
    ExponentialRamp,
    /// Exponential approach toward the event value.
    Target {
        /// Time constant in seconds (time to cover ~63% of the distance).
        time_constant: f64,
    },
    /// Explicit curve starting at the event time.
    Curve {
        /// Curve points, already in the raw domain.
        values: Vec<f64>,
        /// Seconds over which the points are spread.
        duration: f64,
    },
}

/// A scheduled change on a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationEvent {
    /// Event time in engine seconds. For ramps this is the end time.
    pub time: f64,
    /// Target value. For curves, the last curve point.
    pub value: f64,
    /// Segment shape.
    pub kind: EventKind,
}

impl AutomationEvent {
    /// Point a following ramp starts from, given the value in effect when
    /// this event began.
    fn anchor(&self, entry: f64) -> (f64, f64) {
        match &self.kind {
            EventKind::Set | EventKind::LinearRamp | EventKind::ExponentialRamp => {
                (self.time, self.value)
            }
            EventKind::Target { .. } => (self.time, entry),
            EventKind::Curve { duration, .. } => (self.time + duration, self.value),
        }
    }

    /// Value of this event's segment at `time` (at or after the event).
    fn sustain(&self, entry: f64, time: f64) -> f64 {
        match &self.kind {
            EventKind::Set | EventKind::LinearRamp | EventKind::ExponentialRamp => self.value,
            EventKind::Target { time_constant } => {
                self.value + (entry - self.value) * exp(-(time - self.time) / time_constant)
            }
            EventKind::Curve { values, duration } => curve_value(values, self.time, *duration, time),
        }
    }
}

/// Time-ordered automation events for one parameter.
///
/// # Example
///
/// ```rust
/// use sonant_core::AutomationTimeline;
///
/// let mut timeline = AutomationTimeline::new(0.0);
/// timeline.set_value_at_time(0.0, 1.0);
/// timeline.linear_ramp_to_value_at_time(1.0, 3.0);
///
/// assert_eq!(timeline.value_at(0.5), 0.0);
/// assert_eq!(timeline.value_at(2.0), 0.5);
/// assert_eq!(timeline.value_at(4.0), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationTimeline {
    /// Value reported before the first event.
    intrinsic: f64,
    events: Vec<AutomationEvent>,
}

impl AutomationTimeline {
    /// Creates an empty timeline holding `intrinsic`.
    pub fn new(intrinsic: f64) -> Self {
        Self {
            intrinsic,
            events: Vec::new(),
        }
    }

    /// Value reported before the first event.
    #[inline]
    pub fn intrinsic(&self) -> f64 {
        self.intrinsic
    }

    /// Replaces the pre-timeline value.
    #[inline]
    pub fn set_intrinsic(&mut self, value: f64) {
        self.intrinsic = value;
    }

    /// Scheduled events, sorted by time.
    #[inline]
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Returns `true` if nothing is scheduled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Inserts an event after every event at or before its time.
    ///
    /// Events already scheduled before `event.time` are untouched; on equal
    /// times the newest event wins.
    pub fn insert(&mut self, event: AutomationEvent) {
        let idx = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(idx, event);
    }

    /// Schedules a jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            kind: EventKind::Set,
        });
    }

    /// Schedules a linear ramp ending at `value` at `end_time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        self.insert(AutomationEvent {
            time: end_time,
            value,
            kind: EventKind::LinearRamp,
        });
    }

    /// Schedules an exponential ramp ending at `value` at `end_time`.
    ///
    /// `value` is floored to [`MIN_OUTPUT`].
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        self.insert(AutomationEvent {
            time: end_time,
            value: floor_output(value),
            kind: EventKind::ExponentialRamp,
        });
    }

    /// Schedules an exponential approach toward `value` starting at
    /// `start_time`.
    ///
    /// Both `value` and `time_constant` are floored to [`MIN_OUTPUT`].
    pub fn set_target_at_time(&mut self, value: f64, start_time: f64, time_constant: f64) {
        self.insert(AutomationEvent {
            time: start_time,
            value: floor_output(value),
            kind: EventKind::Target {
                time_constant: floor_output(time_constant),
            },
        });
    }

    /// Schedules an explicit curve of raw values from `start_time` over
    /// `duration` seconds. An empty curve is ignored.
    pub fn set_value_curve_at_time(&mut self, values: Vec<f64>, start_time: f64, duration: f64) {
        let Some(&last) = values.last() else {
            return;
        };
        self.insert(AutomationEvent {
            time: start_time,
            value: last,
            kind: EventKind::Curve { values, duration },
        });
    }

    /// Removes every event at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time < time);
    }

    /// Removes every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Computes the automated value at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        // Most recently started event, with the value in effect when it began.
        let mut current: Option<(&AutomationEvent, f64)> = None;

        for event in &self.events {
            if event.time > time {
                let (t0, v0) = current.map_or((0.0, self.intrinsic), |(e, entry)| e.anchor(entry));
                // A ramp begins where the previous segment settles (a curve's
                // end); before that the previous segment still plays.
                return match event.kind {
                    EventKind::LinearRamp if time >= t0 => {
                        linear_ramp(t0, v0, event.time, event.value, time)
                    }
                    EventKind::ExponentialRamp if time >= t0 => {
                        exponential_ramp(t0, v0, event.time, event.value, time)
                    }
                    _ => current.map_or(self.intrinsic, |(e, entry)| e.sustain(entry, time)),
                };
            }
            let entry = current.map_or(self.intrinsic, |(e, entry)| e.sustain(entry, event.time));
            current = Some((event, entry));
        }

        current.map_or(self.intrinsic, |(e, entry)| e.sustain(entry, time))
    }
}

impl Default for AutomationTimeline {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Floors a value to [`MIN_OUTPUT`], for exponential-family scheduling.
#[inline]
pub fn floor_output(value: f64) -> f64 {
    if value < MIN_OUTPUT {
        #[cfg(feature = "tracing")]
        tracing::trace!("automation_floor: {value} -> {MIN_OUTPUT}");
        MIN_OUTPUT
    } else {
        value
    }
}

fn linear_ramp(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    if t1 <= t0 {
        return if t < t1 { v0 } else { v1 };
    }
    if t <= t0 {
        return v0;
    }
    v0 + (v1 - v0) * (t - t0) / (t1 - t0)
}

fn exponential_ramp(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    if t1 <= t0 {
        return if t < t1 { v0 } else { v1 };
    }
    if t <= t0 || v0 == 0.0 || v0 * v1 < 0.0 {
        return v0;
    }
    v0 * pow(v1 / v0, (t - t0) / (t1 - t0))
}

fn curve_value(values: &[f64], start: f64, duration: f64, t: f64) -> f64 {
    let last = values.len() - 1;
    if last == 0 || t >= start + duration {
        return values[last];
    }
    let pos = (t - start).max(0.0) / duration * last as f64;
    let k = floor(pos) as usize;
    if k >= last {
        return values[last];
    }
    let frac = pos - k as f64;
    values[k] + (values[k + 1] - values[k]) * frac
}
