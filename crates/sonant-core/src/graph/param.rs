//! Automatable parameters owned by engine nodes.

use crate::automation::AutomationTimeline;

use super::arena::Key;
use super::edge::EdgeId;
use super::node::NodeId;

/// Unique identifier for an automatable parameter.
///
/// Slots are reused once freed; the generation keeps an ID from a removed
/// parameter from resolving to whatever later takes its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamId(pub(crate) Key);

impl ParamId {
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

impl core::fmt::Display for ParamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ParamId({})", self.0)
    }
}

/// Internal bookkeeping for a parameter.
#[derive(Debug)]
pub(crate) struct ParamData {
    /// Node the parameter belongs to; removing the node removes the parameter.
    pub owner: NodeId,
    pub timeline: AutomationTimeline,
    /// Audio-rate connections summed into the automation value.
    pub incoming: Vec<EdgeId>,
}

impl ParamData {
    pub fn new(owner: NodeId, intrinsic: f64) -> Self {
        Self {
            owner,
            timeline: AutomationTimeline::new(intrinsic),
            incoming: Vec::new(),
        }
    }
}
