use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::node::BcTag;

/// A boundary face: 3 or 4 node indices plus a BC tag (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryFace {
    pub nodes: SmallVec<[u32; 4]>,
    pub tag: BcTag,
}

impl BoundaryFace {
    pub fn new(nodes: impl Into<SmallVec<[u32; 4]>>, tag: BcTag) -> Self {
        let nodes = nodes.into();
        debug_assert!(nodes.len() == 3 || nodes.len() == 4);
        BoundaryFace { nodes, tag }
    }

    pub fn is_solid(&self) -> bool {
        matches!(self.tag, BcTag::Solid)
    }

    pub fn is_interpolation(&self) -> bool {
        matches!(self.tag, BcTag::Interpolation)
    }

    pub fn symmetry_axis(&self) -> Option<usize> {
        match self.tag {
            BcTag::SymmetryX => Some(0),
            BcTag::SymmetryY => Some(1),
            BcTag::SymmetryZ => Some(2),
            _ => None,
        }
    }
}
