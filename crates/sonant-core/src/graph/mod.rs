//! Reference rendering engine: a small node graph evaluated sample by sample.
//!
//! Signals and operators are built by wiring a handful of primitive nodes:
//!
//! | Kind | Ports | Params | Output |
//! |------|-------|--------|--------|
//! | `Constant` | none | none | 1.0 |
//! | `Gain` | `INPUT` | gain | input × gain |
//! | `Compare(op)` | `COMPARE_LHS`, `COMPARE_RHS` | none | 1.0 / 0.0 |
//! | `Switch` | `SWITCH_GATE`, `SWITCH_ON`, `SWITCH_OFF` | none | `ON` if gate ≥ 0.5, else `OFF` |
//! | `Thru` | `INPUT` | none | sum of inputs |
//!
//! Connections go from a node output to an [`Inlet`]: either a node port or a
//! parameter. Multiple connections into the same inlet are summed.
//!
//! ## Architecture
//!
//! - Nodes, params and edges live in generational slot arenas addressed by
//!   [`NodeId`], [`ParamId`] and [`EdgeId`]; freed slots are reused, and a
//!   stale ID never resolves to the slot's new occupant
//! - Cycles are rejected at connect time (DFS reachability)
//! - Render order is a Kahn topological sort, recomputed lazily after any
//!   topology change
//! - Each frame, every node reads its upstream outputs from the same frame

mod arena;
mod edge;
mod engine;
mod node;
mod param;

pub use edge::{EdgeId, Inlet};
pub use engine::{Engine, GraphError};
pub use node::{CompareOp, NodeId, NodeKind};
pub use param::ParamId;
