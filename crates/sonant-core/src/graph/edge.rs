//! Connection types for the reference rendering engine.
//!
//! An `Edge` carries one node's output into either an input port of another
//! node or one of its automatable parameters. A parameter's rendered value is
//! its automation value plus the sum of everything connected into it.

use super::arena::Key;
use super::node::NodeId;
use super::param::ParamId;

/// Unique identifier for an edge in the engine.
///
/// Slots are reused once freed; the generation keeps an ID from a removed
/// edge from resolving to whatever later takes its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) Key);

impl EdgeId {
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

impl core::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// Destination of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Inlet {
    /// An input port of a node.
    Node {
        /// Receiving node.
        node: NodeId,
        /// Port index on the receiving node.
        port: usize,
    },
    /// An automatable parameter; the connection adds to its automation value.
    Param(ParamId),
}

impl Inlet {
    /// Port `port` of `node`.
    #[inline]
    pub fn port(node: NodeId, port: usize) -> Self {
        Inlet::Node { node, port }
    }
}

impl From<NodeId> for Inlet {
    fn from(node: NodeId) -> Self {
        Inlet::Node { node, port: 0 }
    }
}

impl From<ParamId> for Inlet {
    fn from(param: ParamId) -> Self {
        Inlet::Param(param)
    }
}

impl core::fmt::Display for Inlet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Inlet::Node { node, port } => write!(f, "{node}[{port}]"),
            Inlet::Param(param) => write!(f, "{param}"),
        }
    }
}

/// A directed connection.
#[derive(Debug)]
pub(crate) struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Destination port or parameter.
    pub to: Inlet,
}
