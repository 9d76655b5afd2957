//! Reference rendering engine: node arena, connections and sample rendering.
//!
//! [`Engine`] owns every node, parameter and edge. Mutations (add, remove,
//! connect, disconnect) invalidate the compiled render order; the next
//! [`render()`](Engine::render) recompiles it with Kahn's algorithm and then
//! evaluates every node once per sample frame, in topological order.
//!
//! A parameter's per-frame value is its [`AutomationTimeline`] evaluated at
//! the frame time plus the sum of all node outputs connected into it. This is
//! the only way audio-rate signals reach a parameter, and it is what lets a
//! [`Signal`](crate::Signal) drive another parameter.

use thiserror::Error;

use crate::automation::AutomationTimeline;

use super::arena::Arena;
use super::edge::{Edge, EdgeId, Inlet};
use super::node::{CompareOp, NodeData, NodeId, NodeKind};
use super::param::{ParamData, ParamId};

/// Errors that can occur during graph operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// The node does not exist (never created, or removed).
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// The parameter does not exist (its owner was removed).
    #[error("parameter {0} not found")]
    ParamNotFound(ParamId),
    /// The edge does not exist.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),
    /// Adding this edge would create a cycle.
    #[error("connecting {from} to {to} would create a cycle")]
    CycleDetected {
        /// Source node.
        from: NodeId,
        /// Requested destination.
        to: Inlet,
    },
    /// The same connection already exists.
    #[error("edge from {from} to {to} already exists")]
    DuplicateEdge {
        /// Source node.
        from: NodeId,
        /// Destination.
        to: Inlet,
    },
    /// The destination node has no such input port.
    #[error("{node} ({kind}) has {ports} input ports, port {port} requested")]
    InvalidPort {
        /// Receiving node.
        node: NodeId,
        /// Receiving node's kind name.
        kind: &'static str,
        /// Requested port.
        port: usize,
        /// Ports available.
        ports: usize,
    },
    /// The node is not of the kind the operation needs.
    #[error("{node} is a {actual} node, expected {expected}")]
    WrongKind {
        /// The node.
        node: NodeId,
        /// Expected kind name.
        expected: &'static str,
        /// Actual kind name.
        actual: &'static str,
    },
    /// The node is pinned and cannot be removed or bulk-disconnected.
    #[error("node {0} is pinned and cannot be removed or disconnected")]
    Pinned(NodeId),
}

/// Offline, sample-accurate node graph renderer.
///
/// # Usage
///
/// 1. Create with [`new()`](Self::new)
/// 2. Add nodes: [`add_constant()`](Self::add_constant),
///    [`add_pinned()`](Self::add_pinned),
///    [`add_gain()`](Self::add_gain), [`add_compare()`](Self::add_compare),
///    [`add_switch()`](Self::add_switch), [`add_thru()`](Self::add_thru)
/// 3. Connect: [`connect()`](Self::connect)
/// 4. Automate parameters: [`param_mut()`](Self::param_mut)
/// 5. Render: [`render()`](Self::render)
///
/// ```rust
/// use sonant_core::graph::Engine;
///
/// let mut engine = Engine::new(1000.0);
/// let one = engine.add_constant();
/// let amp = engine.add_gain(0.0);
/// engine.connect(one, amp).unwrap();
///
/// let gain = engine.gain_param(amp).unwrap();
/// engine.param_mut(gain).unwrap().set_value_at_time(3.0, 0.002);
///
/// let out = engine.render(4, amp).unwrap();
/// assert_eq!(out, vec![0.0, 0.0, 3.0, 3.0]);
/// ```
#[derive(Debug)]
pub struct Engine {
    nodes: Arena<NodeData>,
    params: Arena<ParamData>,
    edges: Arena<Edge>,
    /// Node slot indices in render order; `None` after any topology change.
    order: Option<Vec<usize>>,
    sample_rate: f64,
    /// Frames rendered so far.
    frame: u64,
}

impl Engine {
    /// Creates an empty engine at the given sample rate (Hz).
    pub fn new(sample_rate: f64) -> Self {
        Self {
            nodes: Arena::new(),
            params: Arena::new(),
            edges: Arena::new(),
            order: None,
            sample_rate,
            frame: 0,
        }
    }

    /// Returns the sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Returns the number of frames rendered so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current engine time in seconds: the time of the next frame to render.
    #[inline]
    pub fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    // --- Node mutations ---

    /// Adds an always-on unity source.
    pub fn add_constant(&mut self) -> NodeId {
        self.add_node(NodeKind::Constant)
    }

    /// Adds a gain stage whose gain parameter starts at `gain`.
    pub fn add_gain(&mut self, gain: f64) -> NodeId {
        let id = self.add_node(NodeKind::Gain);
        if let Ok(param) = self.gain_param(id) {
            if let Some(data) = self.params.get_mut(param.0) {
                data.timeline.set_intrinsic(gain);
            }
        }
        id
    }

    /// Adds a comparator.
    pub fn add_compare(&mut self, op: CompareOp) -> NodeId {
        self.add_node(NodeKind::Compare(op))
    }

    /// Adds a gated switch.
    pub fn add_switch(&mut self) -> NodeId {
        self.add_node(NodeKind::Switch)
    }

    /// Adds a summing pass-through node.
    pub fn add_thru(&mut self) -> NodeId {
        self.add_node(NodeKind::Thru)
    }

    /// Adds a node of any kind, creating its parameters.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        self.insert_node(kind, false)
    }

    /// Adds a node that can never be removed or bulk-disconnected.
    pub fn add_pinned(&mut self, kind: NodeKind) -> NodeId {
        self.insert_node(kind, true)
    }

    fn insert_node(&mut self, kind: NodeKind, pinned: bool) -> NodeId {
        let id = NodeId(self.nodes.next_key());
        let params = (0..kind.param_count())
            .map(|_| ParamId(self.params.insert(ParamData::new(id, 0.0))))
            .collect();
        let mut data = NodeData::new(kind, params);
        data.pinned = pinned;
        self.nodes.insert(data);
        self.order = None;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id}", kind.name());
        id
    }

    /// Returns `true` if the node exists and is pinned.
    pub fn is_pinned(&self, id: NodeId) -> bool {
        self.get_node(id).is_ok_and(|n| n.pinned)
    }

    /// Removes a node, its parameters, and every edge touching either.
    ///
    /// The node's slot, and those of its parameters and edges, are reused by
    /// later additions; the removed IDs stay invalid.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.get_unpinned(id)?;

        let mut edge_ids: Vec<EdgeId> = node
            .incoming
            .iter()
            .chain(node.outgoing.iter())
            .copied()
            .collect();
        let params = node.params.clone();
        for param in &params {
            if let Some(data) = self.params.get(param.0) {
                edge_ids.extend(data.incoming.iter().copied());
            }
        }

        for edge_id in edge_ids {
            self.disconnect_internal(edge_id);
        }
        for param in params {
            self.params.remove(param.0);
        }
        self.nodes.remove(id.0);
        self.order = None;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}");
        Ok(())
    }

    // --- Connections ---

    /// Connects a node's output to a port or parameter.
    ///
    /// Returns the new edge's ID, or an error if:
    /// - Either endpoint doesn't exist
    /// - The destination port is out of range
    /// - The edge would create a cycle
    /// - The same connection already exists
    pub fn connect(&mut self, from: NodeId, to: impl Into<Inlet>) -> Result<EdgeId, GraphError> {
        let to = to.into();
        self.get_node(from)?;
        let target = self.inlet_owner(to)?;

        if let Inlet::Node { node, port } = to {
            let kind = self.get_node(node)?.kind;
            if port >= kind.port_count() {
                return Err(GraphError::InvalidPort {
                    node,
                    kind: kind.name(),
                    port,
                    ports: kind.port_count(),
                });
            }
        }

        if self.has_edge(from, to) {
            return Err(GraphError::DuplicateEdge { from, to });
        }

        // A cycle exists if the destination can already reach the source.
        if target == from || self.can_reach(target, from) {
            return Err(GraphError::CycleDetected { from, to });
        }

        let edge_id = EdgeId(self.edges.insert(Edge { from, to }));

        if let Some(node) = self.nodes.get_mut(from.0) {
            node.outgoing.push(edge_id);
        }
        match to {
            Inlet::Node { node, .. } => {
                if let Some(node) = self.nodes.get_mut(node.0) {
                    node.incoming.push(edge_id);
                }
            }
            Inlet::Param(param) => {
                if let Some(param) = self.params.get_mut(param.0) {
                    param.incoming.push(edge_id);
                }
            }
        }

        self.order = None;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(edge_id)
    }

    /// Removes one edge.
    pub fn disconnect(&mut self, id: EdgeId) -> Result<(), GraphError> {
        if self.edges.get(id.0).is_none() {
            return Err(GraphError::EdgeNotFound(id));
        }
        self.disconnect_internal(id);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: edge {id}");
        Ok(())
    }

    /// Removes every edge leaving `node`. Returns how many were removed.
    pub fn disconnect_all(&mut self, node: NodeId) -> Result<usize, GraphError> {
        let outgoing = self.get_unpinned(node)?.outgoing.clone();
        let count = outgoing.len();
        for edge_id in outgoing {
            self.disconnect_internal(edge_id);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {count} edges from {node}");
        Ok(count)
    }

    fn disconnect_internal(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.remove(id.0) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(edge.from.0) {
            node.outgoing.retain(|&e| e != id);
        }
        match edge.to {
            Inlet::Node { node, .. } => {
                if let Some(node) = self.nodes.get_mut(node.0) {
                    node.incoming.retain(|&e| e != id);
                }
            }
            Inlet::Param(param) => {
                if let Some(param) = self.params.get_mut(param.0) {
                    param.incoming.retain(|&e| e != id);
                }
            }
        }
        self.order = None;
    }

    // --- Queries ---

    /// Returns the kind of a node.
    pub fn node_kind(&self, id: NodeId) -> Result<NodeKind, GraphError> {
        Ok(self.get_node(id)?.kind)
    }

    /// Returns `true` if the node exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_ok()
    }

    /// Returns the number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of node slots allocated, live or vacant.
    pub fn node_capacity(&self) -> usize {
        self.nodes.slot_count()
    }

    /// Returns the number of live nodes of `kind`.
    pub fn count_nodes(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    /// Returns the number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of edges arriving at an inlet.
    pub fn inlet_edge_count(&self, inlet: impl Into<Inlet>) -> Result<usize, GraphError> {
        let inlet = inlet.into();
        Ok(match inlet {
            Inlet::Node { node, port } => self
                .get_node(node)?
                .incoming
                .iter()
                .filter(|&&e| {
                    self.edges
                        .get(e.0)
                        .is_some_and(|edge| edge.to == Inlet::Node { node, port })
                })
                .count(),
            Inlet::Param(param) => self.get_param(param)?.incoming.len(),
        })
    }

    /// Returns the gain parameter of a gain node.
    pub fn gain_param(&self, node: NodeId) -> Result<ParamId, GraphError> {
        let data = self.get_node(node)?;
        match data.kind {
            NodeKind::Gain => Ok(data.params[0]),
            other => Err(GraphError::WrongKind {
                node,
                expected: NodeKind::Gain.name(),
                actual: other.name(),
            }),
        }
    }

    /// Returns a parameter's automation timeline.
    pub fn param(&self, id: ParamId) -> Result<&AutomationTimeline, GraphError> {
        Ok(&self.get_param(id)?.timeline)
    }

    /// Returns a parameter's automation timeline for scheduling.
    pub fn param_mut(&mut self, id: ParamId) -> Result<&mut AutomationTimeline, GraphError> {
        self.params
            .get_mut(id.0)
            .map(|p| &mut p.timeline)
            .ok_or(GraphError::ParamNotFound(id))
    }

    /// Returns the last rendered output sample of a node.
    pub fn output(&self, id: NodeId) -> Result<f64, GraphError> {
        Ok(self.get_node(id)?.output)
    }

    // --- Rendering ---

    /// Computes the render order (Kahn's algorithm) if the topology changed.
    ///
    /// Cycles are rejected at [`connect()`](Self::connect) time, so this only
    /// fails if that invariant was broken.
    pub fn compile(&mut self) -> Result<(), GraphError> {
        if self.order.is_some() {
            return Ok(());
        }
        let n = self.nodes.slot_count();
        let mut in_degree = vec![0u32; n];
        for edge in self.edges.values() {
            if let Ok(owner) = self.inlet_owner(edge.to) {
                in_degree[owner.0.slot()] += 1;
            }
        }

        let mut queue: Vec<usize> = (0..n)
            .filter(|&i| self.nodes.at(i).is_some() && in_degree[i] == 0)
            .collect();
        let active = self.node_count();
        let mut sorted = Vec::with_capacity(active);

        while let Some(idx) = queue.pop() {
            sorted.push(idx);
            let Some(node) = self.nodes.at(idx) else {
                continue;
            };
            for edge_id in &node.outgoing {
                if let Some(edge) = self.edges.get(edge_id.0) {
                    if let Ok(owner) = self.inlet_owner(edge.to) {
                        let to = owner.0.slot();
                        in_degree[to] -= 1;
                        if in_degree[to] == 0 {
                            queue.push(to);
                        }
                    }
                }
            }
        }

        if sorted.len() != active {
            let stuck = NodeId(
                self.nodes
                    .key_at((0..n).find(|&i| in_degree[i] > 0).unwrap_or(0)),
            );
            return Err(GraphError::CycleDetected {
                from: stuck,
                to: Inlet::from(stuck),
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_sort: {} nodes in render order", sorted.len());
        self.order = Some(sorted);
        Ok(())
    }

    /// Renders `frames` sample frames and returns the output of `tap` for
    /// each, advancing the engine clock.
    pub fn render(&mut self, frames: usize, tap: NodeId) -> Result<Vec<f64>, GraphError> {
        self.get_node(tap)?;
        self.compile()?;
        let order = self.order.take().unwrap_or_default();

        let mut out = Vec::with_capacity(frames);
        let mut param_values: Vec<f64> = Vec::with_capacity(1);
        for _ in 0..frames {
            let time = self.now();
            for &idx in &order {
                let value = self.evaluate(idx, time, &mut param_values);
                if let Some(node) = self.nodes.at_mut(idx) {
                    node.output = value;
                }
            }
            out.push(self.nodes.get(tap.0).map_or(0.0, |n| n.output));
            self.frame += 1;
        }

        self.order = Some(order);
        Ok(out)
    }

    /// Renders `frames` without collecting any output.
    pub fn advance(&mut self, frames: usize) -> Result<(), GraphError> {
        self.compile()?;
        let order = self.order.take().unwrap_or_default();
        let mut param_values: Vec<f64> = Vec::with_capacity(1);
        for _ in 0..frames {
            let time = self.now();
            for &idx in &order {
                let value = self.evaluate(idx, time, &mut param_values);
                if let Some(node) = self.nodes.at_mut(idx) {
                    node.output = value;
                }
            }
            self.frame += 1;
        }
        self.order = Some(order);
        Ok(())
    }

    /// One output sample of node `idx` at `time`, from current upstream outputs.
    fn evaluate(&self, idx: usize, time: f64, param_values: &mut Vec<f64>) -> f64 {
        let Some(node) = self.nodes.at(idx) else {
            return 0.0;
        };

        let mut inputs = [0.0; NodeKind::MAX_PORTS];
        for edge_id in &node.incoming {
            if let Some(edge) = self.edges.get(edge_id.0) {
                if let Inlet::Node { port, .. } = edge.to {
                    inputs[port] += self.upstream(edge.from);
                }
            }
        }

        param_values.clear();
        for param in &node.params {
            let value = self.params.get(param.0).map_or(0.0, |p| {
                let modulation: f64 = p
                    .incoming
                    .iter()
                    .filter_map(|e| self.edges.get(e.0))
                    .map(|e| self.upstream(e.from))
                    .sum();
                p.timeline.value_at(time) + modulation
            });
            param_values.push(value);
        }

        node.kind.process(&inputs, param_values)
    }

    fn upstream(&self, id: NodeId) -> f64 {
        self.nodes.get(id.0).map_or(0.0, |n| n.output)
    }

    // --- Internal helpers ---

    fn get_node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::NodeNotFound(id))
    }

    fn get_unpinned(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        let node = self.get_node(id)?;
        if node.pinned {
            return Err(GraphError::Pinned(id));
        }
        Ok(node)
    }

    fn get_param(&self, id: ParamId) -> Result<&ParamData, GraphError> {
        self.params.get(id.0).ok_or(GraphError::ParamNotFound(id))
    }

    /// The node an inlet belongs to.
    fn inlet_owner(&self, inlet: Inlet) -> Result<NodeId, GraphError> {
        match inlet {
            Inlet::Node { node, .. } => self.get_node(node).map(|_| node),
            Inlet::Param(param) => self.get_param(param).map(|p| p.owner),
        }
    }

    fn has_edge(&self, from: NodeId, to: Inlet) -> bool {
        self.edges.values().any(|e| e.from == from && e.to == to)
    }

    /// Returns `true` if `from` can reach `to` along existing edges.
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.slot_count()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0.slot();
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            if let Some(node) = self.nodes.get(current.0) {
                for edge_id in &node.outgoing {
                    if let Some(edge) = self.edges.get(edge_id.0) {
                        if let Ok(owner) = self.inlet_owner(edge.to) {
                            stack.push(owner);
                        }
                    }
                }
            }
        }
        false
    }
}
