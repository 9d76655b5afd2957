//! Node types for the reference rendering engine.
//!
//! Each node has a [`NodeId`] and a [`NodeKind`] that fixes its input ports,
//! its automatable parameters, and how it turns inputs into one output sample.
//! `NodeData` bundles the kind with adjacency lists and the last rendered
//! sample.

use super::arena::Key;
use super::edge::EdgeId;
use super::param::ParamId;

/// Unique identifier for a node in the engine.
///
/// Slots are reused once freed; the generation keeps an ID from a removed
/// node from resolving to whatever later takes its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Key);

impl NodeId {
    /// Returns the slot index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0.index
    }

    /// Returns how many times the slot had been reused when this ID was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        self.0.generation
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Comparison performed by a [`NodeKind::Compare`] node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// High when `lhs < rhs`.
    LessThan,
    /// High when `lhs > rhs`.
    GreaterThan,
}

impl CompareOp {
    /// Returns 1.0 when the comparison holds, 0.0 otherwise.
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        let high = match self {
            CompareOp::LessThan => lhs < rhs,
            CompareOp::GreaterThan => lhs > rhs,
        };
        if high { 1.0 } else { 0.0 }
    }
}

/// The role of a node.
///
/// Port numbers for multi-input nodes are the associated constants on
/// [`NodeKind`] (e.g. [`NodeKind::SWITCH_GATE`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Always-on unity output. No inputs.
    Constant,
    /// Multiplies its input by its gain parameter.
    Gain,
    /// Two-input comparator producing 0.0 / 1.0.
    Compare(CompareOp),
    /// Passes `ON` when `GATE` is high, otherwise `OFF`.
    Switch,
    /// Sums its input connections unchanged. Used as a port node.
    Thru,
}

impl NodeKind {
    /// Input port of single-input nodes.
    pub const INPUT: usize = 0;
    /// Left-hand operand of a comparator.
    pub const COMPARE_LHS: usize = 0;
    /// Right-hand operand of a comparator.
    pub const COMPARE_RHS: usize = 1;
    /// Selector input of a switch.
    pub const SWITCH_GATE: usize = 0;
    /// Data input passed while the gate is high.
    pub const SWITCH_ON: usize = 1;
    /// Data input passed while the gate is low.
    pub const SWITCH_OFF: usize = 2;

    /// Gate level at or above which a switch selects `ON`.
    pub const GATE_THRESHOLD: f64 = 0.5;

    /// Maximum port count across all kinds.
    pub(crate) const MAX_PORTS: usize = 3;

    /// Number of input ports.
    pub fn port_count(self) -> usize {
        match self {
            NodeKind::Constant => 0,
            NodeKind::Gain | NodeKind::Thru => 1,
            NodeKind::Compare(_) => 2,
            NodeKind::Switch => 3,
        }
    }

    /// Number of automatable parameters the node owns.
    pub fn param_count(self) -> usize {
        match self {
            NodeKind::Gain => 1,
            _ => 0,
        }
    }

    /// Short lowercase name for logs.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Constant => "constant",
            NodeKind::Gain => "gain",
            NodeKind::Compare(CompareOp::LessThan) => "less_than",
            NodeKind::Compare(CompareOp::GreaterThan) => "greater_than",
            NodeKind::Switch => "switch",
            NodeKind::Thru => "thru",
        }
    }

    /// Computes one output sample from summed port inputs and parameter values.
    #[inline]
    pub(crate) fn process(self, inputs: &[f64; Self::MAX_PORTS], params: &[f64]) -> f64 {
        match self {
            NodeKind::Constant => 1.0,
            NodeKind::Gain => inputs[Self::INPUT] * params[0],
            NodeKind::Compare(op) => op.apply(inputs[Self::COMPARE_LHS], inputs[Self::COMPARE_RHS]),
            NodeKind::Switch => {
                if inputs[Self::SWITCH_GATE] >= Self::GATE_THRESHOLD {
                    inputs[Self::SWITCH_ON]
                } else {
                    inputs[Self::SWITCH_OFF]
                }
            }
            NodeKind::Thru => inputs[Self::INPUT],
        }
    }
}

/// Internal bookkeeping for a node in the engine.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    /// Edges arriving at this node's ports.
    pub incoming: Vec<EdgeId>,
    /// Edges leaving this node.
    pub outgoing: Vec<EdgeId>,
    /// Parameters owned by this node, in kind order.
    pub params: Vec<ParamId>,
    /// Last rendered output sample.
    pub output: f64,
    /// Refuses removal and bulk disconnection.
    pub pinned: bool,
}

impl NodeData {
    pub fn new(kind: NodeKind, params: Vec<ParamId>) -> Self {
        Self {
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            params,
            output: 0.0,
            pinned: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_ops() {
        assert_eq!(CompareOp::LessThan.apply(3.0, 5.0), 1.0);
        assert_eq!(CompareOp::LessThan.apply(5.0, 5.0), 0.0);
        assert_eq!(CompareOp::GreaterThan.apply(8.0, 5.0), 1.0);
        assert_eq!(CompareOp::GreaterThan.apply(3.0, 5.0), 0.0);
    }

    #[test]
    fn switch_selects_by_gate() {
        let on = [1.0, 7.0, -2.0];
        let off = [0.0, 7.0, -2.0];
        assert_eq!(NodeKind::Switch.process(&on, &[]), 7.0);
        assert_eq!(NodeKind::Switch.process(&off, &[]), -2.0);
    }

    #[test]
    fn gain_scales_input() {
        assert_eq!(NodeKind::Gain.process(&[0.5, 0.0, 0.0], &[4.0]), 2.0);
        assert_eq!(NodeKind::Constant.process(&[0.0; 3], &[]), 1.0);
    }

    #[test]
    fn port_and_param_counts() {
        assert_eq!(NodeKind::Constant.port_count(), 0);
        assert_eq!(NodeKind::Switch.port_count(), 3);
        assert_eq!(NodeKind::Gain.param_count(), 1);
        assert_eq!(NodeKind::Thru.param_count(), 0);
    }
}
