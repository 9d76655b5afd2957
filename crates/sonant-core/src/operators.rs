//! Derived operators built purely by wiring primitive nodes.
//!
//! No operator here has per-sample code of its own. Each is a comparator that
//! gates a switch choosing between two signal paths, so it renders with the
//! same sample accuracy as any scheduled [`Signal`]:
//!
//! ```text
//!            ┌──────────────▶ [compare] ──gate──┐
//! input ──▶ [thru] ─────────────────────on────▶ [switch] ──▶ [thru] ──▶ output
//!            threshold ──▶ [compare]  ──off───▶
//! ```
//!
//! | Operator | Comparator | Output |
//! |----------|------------|--------|
//! | [`Min`] | input < threshold | `min(input, threshold)` |
//! | [`Max`] | input > threshold | `max(input, threshold)` |
//!
//! The threshold is an ordinary [`Signal`], so it can be set, scheduled or
//! driven by another signal.

use crate::context::Context;
use crate::error::Result;
use crate::graph::{CompareOp, EdgeId, Inlet, NodeId, NodeKind};
use crate::signal::Signal;
use crate::units::Value;

/// Common port interface of primitive and composite signal nodes.
pub trait SignalNode {
    /// Where upstream signals connect, if the node accepts input.
    fn input(&self) -> Option<Inlet>;

    /// Node carrying the result.
    fn output(&self) -> NodeId;

    /// Connects the output to a port or parameter.
    fn connect(&self, ctx: &mut Context, to: Inlet) -> Result<EdgeId> {
        Ok(ctx.engine_mut().connect(self.output(), to)?)
    }

    /// Removes every connection leaving the output.
    fn disconnect(&self, ctx: &mut Context) -> Result<()> {
        ctx.engine_mut().disconnect_all(self.output())?;
        Ok(())
    }

    /// Disconnects and removes every node the operator owns.
    fn dispose(self, ctx: &mut Context) -> Result<()>
    where
        Self: Sized;
}

/// Comparator-gated switch between the input and a threshold signal.
#[derive(Debug)]
struct GatedSelect {
    input: NodeId,
    output: NodeId,
    threshold: Signal,
    comparator: NodeId,
    switch: NodeId,
}

impl GatedSelect {
    /// Passes the input while `op(input, threshold)` holds, else the threshold.
    fn new(ctx: &mut Context, threshold: Value, op: CompareOp) -> Result<Self> {
        let threshold = Signal::new(ctx, threshold)?;
        let level = threshold.output();

        let engine = ctx.engine_mut();
        let input = engine.add_thru();
        let output = engine.add_thru();
        let comparator = engine.add_compare(op);
        let switch = engine.add_switch();

        engine.connect(input, Inlet::port(comparator, NodeKind::COMPARE_LHS))?;
        engine.connect(level, Inlet::port(comparator, NodeKind::COMPARE_RHS))?;
        engine.connect(comparator, Inlet::port(switch, NodeKind::SWITCH_GATE))?;
        engine.connect(input, Inlet::port(switch, NodeKind::SWITCH_ON))?;
        engine.connect(level, Inlet::port(switch, NodeKind::SWITCH_OFF))?;
        engine.connect(switch, output)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "operator_new: {} {input} → {output}, threshold {level}",
            NodeKind::Compare(op).name()
        );

        Ok(Self {
            input,
            output,
            threshold,
            comparator,
            switch,
        })
    }

    fn dispose(self, ctx: &mut Context) -> Result<()> {
        let engine = ctx.engine_mut();
        engine.disconnect_all(self.input)?;
        engine.disconnect_all(self.output)?;
        self.threshold.dispose(ctx)?;

        let engine = ctx.engine_mut();
        engine.remove_node(self.comparator)?;
        engine.remove_node(self.switch)?;
        engine.remove_node(self.input)?;
        engine.remove_node(self.output)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("operator_dispose: {} → {}", self.input, self.output);
        Ok(())
    }
}

/// Clamps a signal to at most a threshold.
///
/// # Example
///
/// ```rust
/// use sonant_core::{Context, Min, Signal};
///
/// let mut ctx = Context::new(1000.0);
/// let mut min = Min::new(&mut ctx, 5.0).unwrap();
/// let source = Signal::new(&mut ctx, 8.0).unwrap();
/// source.connect(&mut ctx, min.input()).unwrap();
///
/// assert_eq!(ctx.render(1, min.output()).unwrap(), vec![5.0]);
///
/// min.set_threshold(&mut ctx, 10.0).unwrap();
/// assert_eq!(ctx.render(1, min.output()).unwrap(), vec![8.0]);
/// ```
#[derive(Debug)]
pub struct Min {
    select: GatedSelect,
}

impl Min {
    /// Creates the operator with an initial threshold.
    pub fn new(ctx: &mut Context, threshold: impl Into<Value>) -> Result<Self> {
        Ok(Self {
            select: GatedSelect::new(ctx, threshold.into(), CompareOp::LessThan)?,
        })
    }

    /// Port upstream signals connect into.
    #[inline]
    pub fn input(&self) -> Inlet {
        Inlet::from(self.select.input)
    }

    /// Node carrying the clamped signal.
    #[inline]
    pub fn output(&self) -> NodeId {
        self.select.output
    }

    /// The threshold signal, for scheduling.
    pub fn threshold(&mut self) -> &mut Signal {
        &mut self.select.threshold
    }

    /// Sets the threshold now.
    pub fn set_threshold(&mut self, ctx: &mut Context, value: impl Into<Value>) -> Result<()> {
        self.select.threshold.set_value(ctx, value)
    }

    /// Disconnects the ports, then disposes the threshold signal, comparator
    /// and switch.
    pub fn dispose(self, ctx: &mut Context) -> Result<()> {
        self.select.dispose(ctx)
    }
}

impl SignalNode for Min {
    fn input(&self) -> Option<Inlet> {
        Some(Min::input(self))
    }

    fn output(&self) -> NodeId {
        Min::output(self)
    }

    fn dispose(self, ctx: &mut Context) -> Result<()> {
        Min::dispose(self, ctx)
    }
}

/// Clamps a signal to at least a threshold.
#[derive(Debug)]
pub struct Max {
    select: GatedSelect,
}

impl Max {
    /// Creates the operator with an initial threshold.
    pub fn new(ctx: &mut Context, threshold: impl Into<Value>) -> Result<Self> {
        Ok(Self {
            select: GatedSelect::new(ctx, threshold.into(), CompareOp::GreaterThan)?,
        })
    }

    /// Port upstream signals connect into.
    #[inline]
    pub fn input(&self) -> Inlet {
        Inlet::from(self.select.input)
    }

    /// Node carrying the clamped signal.
    #[inline]
    pub fn output(&self) -> NodeId {
        self.select.output
    }

    /// The threshold signal, for scheduling.
    pub fn threshold(&mut self) -> &mut Signal {
        &mut self.select.threshold
    }

    /// Sets the threshold now.
    pub fn set_threshold(&mut self, ctx: &mut Context, value: impl Into<Value>) -> Result<()> {
        self.select.threshold.set_value(ctx, value)
    }

    /// Disconnects the ports, then disposes the threshold signal, comparator
    /// and switch.
    pub fn dispose(self, ctx: &mut Context) -> Result<()> {
        self.select.dispose(ctx)
    }
}

impl SignalNode for Max {
    fn input(&self) -> Option<Inlet> {
        Some(Max::input(self))
    }

    fn output(&self) -> NodeId {
        Max::output(self)
    }

    fn dispose(self, ctx: &mut Context) -> Result<()> {
        Max::dispose(self, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 1000.0;

    fn settle(ctx: &mut Context, node: NodeId) -> f64 {
        let out = ctx.render(4, node).unwrap();
        out[out.len() - 1]
    }

    #[test]
    fn min_passes_lower_input() {
        let mut ctx = Context::new(SR);
        let min = Min::new(&mut ctx, 5.0).unwrap();
        let input = Signal::new(&mut ctx, 3.0).unwrap();
        input.connect(&mut ctx, min.input()).unwrap();
        assert_eq!(settle(&mut ctx, min.output()), 3.0);
    }

    #[test]
    fn min_clamps_higher_input() {
        let mut ctx = Context::new(SR);
        let min = Min::new(&mut ctx, 5.0).unwrap();
        let input = Signal::new(&mut ctx, 8.0).unwrap();
        input.connect(&mut ctx, min.input()).unwrap();
        assert_eq!(settle(&mut ctx, min.output()), 5.0);
    }

    #[test]
    fn min_threshold_change_takes_effect() {
        let mut ctx = Context::new(SR);
        let mut min = Min::new(&mut ctx, 5.0).unwrap();
        let input = Signal::new(&mut ctx, 3.0).unwrap();
        input.connect(&mut ctx, min.input()).unwrap();
        assert_eq!(settle(&mut ctx, min.output()), 3.0);
        min.set_threshold(&mut ctx, 2.0).unwrap();
        assert_eq!(settle(&mut ctx, min.output()), 2.0);
    }

    #[test]
    fn min_at_threshold_outputs_threshold() {
        let mut ctx = Context::new(SR);
        let min = Min::new(&mut ctx, 5.0).unwrap();
        let input = Signal::new(&mut ctx, 5.0).unwrap();
        input.connect(&mut ctx, min.input()).unwrap();
        assert_eq!(settle(&mut ctx, min.output()), 5.0);
    }

    #[test]
    fn max_mirrors_min() {
        let mut ctx = Context::new(SR);
        let mut max = Max::new(&mut ctx, 5.0).unwrap();
        let input = Signal::new(&mut ctx, 3.0).unwrap();
        input.connect(&mut ctx, max.input()).unwrap();
        assert_eq!(settle(&mut ctx, max.output()), 5.0);
        max.set_threshold(&mut ctx, 1.0).unwrap();
        assert_eq!(settle(&mut ctx, max.output()), 3.0);
    }

    #[test]
    fn scheduled_threshold_is_sample_accurate() {
        let mut ctx = Context::new(SR);
        let mut min = Min::new(&mut ctx, 5.0).unwrap();
        let input = Signal::new(&mut ctx, 3.0).unwrap();
        input.connect(&mut ctx, min.input()).unwrap();
        min.threshold().set_value_at_time(&mut ctx, 1.0, 0.002).unwrap();
        assert_eq!(
            ctx.render(4, min.output()).unwrap(),
            vec![3.0, 3.0, 1.0, 1.0]
        );
    }

    #[test]
    fn operator_output_chains_into_another() {
        let mut ctx = Context::new(SR);
        let min = Min::new(&mut ctx, 5.0).unwrap();
        let max = Max::new(&mut ctx, 2.0).unwrap();
        SignalNode::connect(&min, &mut ctx, max.input()).unwrap();

        let mut input = Signal::new(&mut ctx, 9.0).unwrap();
        input.connect(&mut ctx, min.input()).unwrap();
        assert_eq!(settle(&mut ctx, max.output()), 5.0);
        input.set_value(&mut ctx, -4.0).unwrap();
        assert_eq!(settle(&mut ctx, max.output()), 2.0);
        input.set_value(&mut ctx, 3.5).unwrap();
        assert_eq!(settle(&mut ctx, max.output()), 3.5);
    }

    #[test]
    fn dispose_releases_every_node() {
        let mut ctx = Context::new(SR);
        let baseline = ctx.engine().node_count();
        let min = Min::new(&mut ctx, 5.0).unwrap();
        let input = Signal::new(&mut ctx, 3.0).unwrap();
        input.connect(&mut ctx, min.input()).unwrap();
        let out = min.output();

        min.dispose(&mut ctx).unwrap();
        assert_eq!(ctx.engine().node_count(), baseline + 1);
        // Only the input signal's own feed remains.
        assert_eq!(ctx.engine().edge_count(), 1);
        assert!(ctx.render(1, out).is_err());
    }

    #[test]
    fn generic_dispose_through_trait() {
        fn release<N: SignalNode>(node: N, ctx: &mut Context) {
            node.dispose(ctx).unwrap();
        }
        let mut ctx = Context::new(SR);
        let max = Max::new(&mut ctx, 0.0).unwrap();
        let signal = Signal::new(&mut ctx, 1.0).unwrap();
        release(max, &mut ctx);
        release(signal, &mut ctx);
        assert_eq!(ctx.engine().node_count(), 1);
        assert_eq!(ctx.provider_count(), 1);
    }
}
