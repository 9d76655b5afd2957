//! Schedulable, unit-aware, connectable audio-rate values.
//!
//! A [`Signal`] is the shared unity source fed through the signal's own gain
//! stage. The gain parameter is the signal's value: everything scheduled on
//! the signal lands on that parameter's timeline, and the gain stage's output
//! is "1 × value" at audio rate, so other nodes can read it like any signal.
//!
//! ```text
//! unity source ──▶ [gain] ──▶ output
//!                    ▲
//!                 value (automation timeline, input)
//! ```
//!
//! Values cross the API in the signal's [`Units`] and are stored raw; see
//! [`units`](crate::units) for the conversion table.
//!
//! # Example
//!
//! ```rust
//! use sonant_core::{Context, Signal, SignalOptions, Units};
//!
//! let mut ctx = Context::new(1000.0);
//! let mut freq = Signal::with_options(
//!     &mut ctx,
//!     SignalOptions { value: "A4".into(), units: Units::Frequency, ..Default::default() },
//! )
//! .unwrap();
//! assert_eq!(freq.value(&ctx), 440.0);
//!
//! // Frequency ramps are exponential: halfway through is the geometric mean.
//! freq.ramp_to(&mut ctx, "A6", 1.0).unwrap();
//! let out = ctx.render(501, freq.output()).unwrap();
//! assert!((out[500] - 880.0).abs() < 1e-6);
//! ```

use crate::automation::floor_output;
use crate::context::Context;
use crate::error::{Result, SignalError, ensure_finite, ensure_time};
use crate::graph::{EdgeId, Inlet, NodeId, ParamId};
use crate::operators::SignalNode;
use crate::time::Time;
use crate::units::{Units, Value};

/// Interpolation used by [`Signal::ramp_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RampKind {
    /// Straight-line interpolation.
    Linear,
    /// Geometric interpolation, perceptually linear for pitch and tempo.
    Exponential,
}

impl RampKind {
    /// Ramp kind that suits `units`: exponential for frequency and tempo,
    /// linear for everything else.
    pub fn for_units(units: Units) -> Self {
        match units {
            Units::Frequency | Units::Bpm => RampKind::Exponential,
            Units::Default
            | Units::Time
            | Units::Decibels
            | Units::NormalRange
            | Units::AudioRange
            | Units::Positive => RampKind::Linear,
        }
    }
}

/// Construction options for [`Signal::with_options`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignalOptions {
    /// Initial value, in `units`.
    pub value: Value,
    /// Semantic units.
    pub units: Units,
    /// When `false`, `units` is a label only and values pass through as-is.
    pub convert: bool,
    /// Engine parameter for this signal to drive. The parameter's own value
    /// is zeroed and the signal's output is summed into it.
    pub param: Option<ParamId>,
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            value: Value::Number(0.0),
            units: Units::Default,
            convert: true,
            param: None,
        }
    }
}

/// A schedulable audio-rate value.
///
/// Scheduling methods take `&mut self` and the owning [`Context`]; every
/// value is converted from the signal's units before it reaches the
/// timeline. [`dispose()`](Self::dispose) consumes the signal, so it cannot
/// be used afterwards.
#[derive(Debug)]
pub struct Signal {
    /// Gain stage; also the public output.
    scaler: NodeId,
    /// The scaler's gain parameter; also the public input.
    param: ParamId,
    units: Units,
    convert: bool,
    overridden: bool,
}

impl Signal {
    /// Creates a signal holding `value` with [`Units::Default`].
    pub fn new(ctx: &mut Context, value: impl Into<Value>) -> Result<Self> {
        Self::with_options(
            ctx,
            SignalOptions {
                value: value.into(),
                ..SignalOptions::default()
            },
        )
    }

    /// Creates a signal with the given units.
    pub fn with_units(ctx: &mut Context, value: impl Into<Value>, units: Units) -> Result<Self> {
        Self::with_options(
            ctx,
            SignalOptions {
                value: value.into(),
                units,
                ..SignalOptions::default()
            },
        )
    }

    /// Creates a signal from full options.
    pub fn with_options(ctx: &mut Context, options: SignalOptions) -> Result<Self> {
        let SignalOptions {
            value,
            units,
            convert,
            param,
        } = options;

        // Convert before touching the engine so a bad value leaves no nodes behind.
        let raw = convert_to_raw(units, convert, ctx, &value)?;

        let source = ctx.constant_source().node();
        let engine = ctx.engine_mut();
        let scaler = engine.add_gain(raw);
        let wired = engine.gain_param(scaler).and_then(|gain| {
            if let Some(target) = param {
                engine.connect(scaler, target)?;
                engine.param_mut(target)?.set_intrinsic(0.0);
            }
            engine.connect(source, scaler)?;
            Ok(gain)
        });
        let gain = match wired {
            Ok(gain) => gain,
            Err(err) => {
                // Drops the scaler and any edge it gained before the failure.
                engine.remove_node(scaler)?;
                return Err(err.into());
            }
        };
        let signal = Self {
            scaler,
            param: gain,
            units,
            convert,
            overridden: false,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "signal_new: {} ({}) = {raw}, drives {:?}",
            signal.scaler,
            signal.units,
            param
        );
        Ok(signal)
    }

    // --- Accessors ---

    /// Node carrying the signal at audio rate.
    #[inline]
    pub fn output(&self) -> NodeId {
        self.scaler
    }

    /// Inlet that overrides the signal when another signal connects into it.
    #[inline]
    pub fn input(&self) -> Inlet {
        Inlet::Param(self.param)
    }

    /// The parameter holding the signal's value.
    #[inline]
    pub fn param(&self) -> ParamId {
        self.param
    }

    /// Semantic units.
    #[inline]
    pub fn units(&self) -> Units {
        self.units
    }

    /// Whether values are unit-converted.
    #[inline]
    pub fn convert(&self) -> bool {
        self.convert
    }

    /// `true` once another signal has been connected into this one.
    #[inline]
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Ramp kind [`ramp_to()`](Self::ramp_to) will use.
    #[inline]
    pub fn ramp_kind(&self) -> RampKind {
        RampKind::for_units(self.units)
    }

    // --- Immediate value ---

    /// Current value in the signal's units.
    ///
    /// Reads the automation timeline at the engine's current time. Audio
    /// connected into [`input()`](Self::input) is not included.
    pub fn value(&self, ctx: &Context) -> f64 {
        let raw = ctx
            .engine()
            .param(self.param)
            .map_or(0.0, |timeline| timeline.value_at(ctx.now()));
        self.to_semantic(raw)
    }

    /// Raw value at an absolute time, as the engine will render it.
    pub fn raw_value_at(&self, ctx: &Context, time: impl Into<Time>) -> Result<f64> {
        let time = ctx.resolve(time)?;
        Ok(ctx.engine().param(self.param)?.value_at(time))
    }

    /// Value in the signal's units at an absolute time.
    pub fn value_at(&self, ctx: &Context, time: impl Into<Time>) -> Result<f64> {
        self.raw_value_at(ctx, time).map(|raw| self.to_semantic(raw))
    }

    /// Sets the value now.
    ///
    /// With nothing scheduled this replaces the resting value; otherwise it
    /// schedules a jump at the current time.
    pub fn set_value(&mut self, ctx: &mut Context, value: impl Into<Value>) -> Result<()> {
        let raw = self.to_raw(ctx, &value.into())?;
        let now = ctx.now();
        let timeline = ctx.engine_mut().param_mut(self.param)?;
        if timeline.is_empty() {
            timeline.set_intrinsic(raw);
        } else {
            timeline.set_value_at_time(raw, now);
        }
        Ok(())
    }

    // --- Scheduling ---

    /// Schedules a jump to `value` at `time`.
    pub fn set_value_at_time(
        &mut self,
        ctx: &mut Context,
        value: impl Into<Value>,
        time: impl Into<Time>,
    ) -> Result<()> {
        let raw = self.to_raw(ctx, &value.into())?;
        let time = ctx.resolve(time)?;
        ctx.engine_mut()
            .param_mut(self.param)?
            .set_value_at_time(raw, time);
        Ok(())
    }

    /// Anchors the current value at `time` (default: now), so a following
    /// ramp starts from where the signal is rather than from the last event.
    pub fn set_ramp_point(&mut self, ctx: &mut Context, time: Option<Time>) -> Result<()> {
        let time = match time {
            Some(t) => ctx.resolve(t)?,
            None => ctx.now(),
        };
        let now = ctx.now();
        let timeline = ctx.engine_mut().param_mut(self.param)?;
        let current = timeline.value_at(now);
        timeline.set_value_at_time(current, time);
        Ok(())
    }

    /// Schedules a linear ramp from the previous event to `value`, ending at
    /// `end_time`.
    pub fn linear_ramp_to_value_at_time(
        &mut self,
        ctx: &mut Context,
        value: impl Into<Value>,
        end_time: impl Into<Time>,
    ) -> Result<()> {
        let raw = self.to_raw(ctx, &value.into())?;
        let end = ctx.resolve(end_time)?;
        ctx.engine_mut()
            .param_mut(self.param)?
            .linear_ramp_to_value_at_time(raw, end);
        Ok(())
    }

    /// Schedules an exponential ramp from the previous event to `value`,
    /// ending at `end_time`. Values below [`MIN_OUTPUT`](crate::MIN_OUTPUT)
    /// are raised to it.
    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        ctx: &mut Context,
        value: impl Into<Value>,
        end_time: impl Into<Time>,
    ) -> Result<()> {
        let raw = floor_output(self.to_raw(ctx, &value.into())?);
        let end = ctx.resolve(end_time)?;
        ctx.engine_mut()
            .param_mut(self.param)?
            .exponential_ramp_to_value_at_time(raw, end);
        Ok(())
    }

    /// Ramps from the current value to `value` over `duration`, linearly or
    /// exponentially according to [`ramp_kind()`](Self::ramp_kind).
    pub fn ramp_to(
        &mut self,
        ctx: &mut Context,
        value: impl Into<Value>,
        duration: impl Into<Time>,
    ) -> Result<()> {
        match self.ramp_kind() {
            RampKind::Linear => self.linear_ramp_to(ctx, value, duration),
            RampKind::Exponential => self.exponential_ramp_to(ctx, value, duration),
        }
    }

    /// Linear ramp from the current value to `value` over `duration`.
    pub fn linear_ramp_to(
        &mut self,
        ctx: &mut Context,
        value: impl Into<Value>,
        duration: impl Into<Time>,
    ) -> Result<()> {
        let raw = self.to_raw(ctx, &value.into())?;
        let end = self.ramp_end(ctx, duration.into())?;
        let now = ctx.now();
        let timeline = ctx.engine_mut().param_mut(self.param)?;
        let current = timeline.value_at(now);
        timeline.set_value_at_time(current, now);
        timeline.linear_ramp_to_value_at_time(raw, end);
        Ok(())
    }

    /// Exponential ramp from the current value to `value` over `duration`.
    ///
    /// The starting point is raised to at least
    /// [`MIN_OUTPUT`](crate::MIN_OUTPUT), since an exponential ramp cannot
    /// leave zero.
    pub fn exponential_ramp_to(
        &mut self,
        ctx: &mut Context,
        value: impl Into<Value>,
        duration: impl Into<Time>,
    ) -> Result<()> {
        let raw = floor_output(self.to_raw(ctx, &value.into())?);
        let end = self.ramp_end(ctx, duration.into())?;
        let now = ctx.now();
        let timeline = ctx.engine_mut().param_mut(self.param)?;
        let current = floor_output(timeline.value_at(now));
        timeline.set_value_at_time(current, now);
        timeline.exponential_ramp_to_value_at_time(raw, end);
        Ok(())
    }

    /// Starts an exponential approach toward `value` at `start_time`.
    ///
    /// `value` and `time_constant` (seconds) are raised to at least
    /// [`MIN_OUTPUT`](crate::MIN_OUTPUT).
    pub fn set_target_at_time(
        &mut self,
        ctx: &mut Context,
        value: impl Into<Value>,
        start_time: impl Into<Time>,
        time_constant: f64,
    ) -> Result<()> {
        let raw = floor_output(self.to_raw(ctx, &value.into())?);
        let time_constant = floor_output(ensure_finite(time_constant)?);
        let start = ctx.resolve(start_time)?;
        ctx.engine_mut()
            .param_mut(self.param)?
            .set_target_at_time(raw, start, time_constant);
        Ok(())
    }

    /// Schedules an explicit curve, each point converted from the signal's
    /// units, spread evenly over `duration` from `start_time`.
    pub fn set_value_curve_at_time<V: Into<Value>>(
        &mut self,
        ctx: &mut Context,
        values: impl IntoIterator<Item = V>,
        start_time: impl Into<Time>,
        duration: impl Into<Time>,
    ) -> Result<()> {
        let raw = values
            .into_iter()
            .map(|v| self.to_raw(ctx, &v.into()))
            .collect::<Result<Vec<f64>>>()?;
        if raw.is_empty() {
            return Err(SignalError::EmptyCurve);
        }
        let start = ctx.resolve(start_time)?;
        let duration = ensure_finite(ctx.clock().duration(&duration.into())?)?;
        if duration <= 0.0 {
            return Err(SignalError::InvalidDuration(duration));
        }
        ctx.engine_mut()
            .param_mut(self.param)?
            .set_value_curve_at_time(raw, start, duration);
        Ok(())
    }

    /// Removes every event at or after `time`.
    pub fn cancel_scheduled_values(&mut self, ctx: &mut Context, time: impl Into<Time>) -> Result<()> {
        let time = ctx.resolve(time)?;
        ctx.engine_mut()
            .param_mut(self.param)?
            .cancel_scheduled_values(time);
        Ok(())
    }

    // --- Connections ---

    /// Connects the output to a node port or parameter.
    ///
    /// A parameter target is taken over: its schedule is cancelled and its
    /// value zeroed, so it follows this signal exactly.
    pub fn connect(&self, ctx: &mut Context, to: impl Into<Inlet>) -> Result<EdgeId> {
        let to = to.into();
        let engine = ctx.engine_mut();
        if let Inlet::Param(param) = to {
            let timeline = engine.param_mut(param)?;
            timeline.clear();
            timeline.set_intrinsic(0.0);
        }
        Ok(engine.connect(self.scaler, to)?)
    }

    /// Connects the output into `other`, overriding its value.
    pub fn connect_signal(&self, ctx: &mut Context, other: &mut Signal) -> Result<EdgeId> {
        let edge = self.connect(ctx, other.input())?;
        other.overridden = true;
        #[cfg(feature = "tracing")]
        tracing::debug!("signal_override: {} drives {}", self.scaler, other.scaler);
        Ok(edge)
    }

    /// Removes every connection leaving the output.
    pub fn disconnect(&self, ctx: &mut Context) -> Result<()> {
        ctx.engine_mut().disconnect_all(self.scaler)?;
        Ok(())
    }

    /// Disconnects and removes the gain stage and its parameter.
    pub fn dispose(self, ctx: &mut Context) -> Result<()> {
        ctx.engine_mut().remove_node(self.scaler)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("signal_dispose: {}", self.scaler);
        Ok(())
    }

    // --- Conversion ---

    fn to_raw(&self, ctx: &Context, value: &Value) -> Result<f64> {
        convert_to_raw(self.units, self.convert, ctx, value)
    }

    fn to_semantic(&self, raw: f64) -> f64 {
        if self.convert {
            self.units.to_semantic(raw)
        } else {
            raw
        }
    }

    fn ramp_end(&self, ctx: &Context, duration: Time) -> Result<f64> {
        let span = ensure_finite(ctx.clock().duration(&duration)?)?;
        if span < 0.0 {
            return Err(SignalError::InvalidDuration(span));
        }
        ensure_time(ctx.now() + span)
    }
}

/// Semantic value to raw, rejecting anything that would not be finite.
fn convert_to_raw(units: Units, convert: bool, ctx: &Context, value: &Value) -> Result<f64> {
    if let Value::Number(n) = value {
        ensure_finite_or_neg_inf(*n)?;
    }
    let units = if convert { units } else { Units::Default };
    ensure_finite(units.to_raw(value, &ctx.clock())?)
}

/// NaN is never a valid semantic value. `-inf` is allowed through so that
/// silence in decibels (`-inf` dB, gain 0) can be written.
fn ensure_finite_or_neg_inf(value: f64) -> Result<f64> {
    if value.is_nan() || value == f64::INFINITY {
        Err(SignalError::NonFinite { value })
    } else {
        Ok(value)
    }
}

impl SignalNode for Signal {
    fn input(&self) -> Option<Inlet> {
        Some(Signal::input(self))
    }

    fn output(&self) -> NodeId {
        self.scaler
    }

    fn connect(&self, ctx: &mut Context, to: Inlet) -> Result<EdgeId> {
        Signal::connect(self, ctx, to)
    }

    fn dispose(self, ctx: &mut Context) -> Result<()> {
        Signal::dispose(self, ctx)
    }
}
