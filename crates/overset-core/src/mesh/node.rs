use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Stable identifier, unique across every partition for the lifetime of the
/// assembly (spec.md §3 "Global ids are stable for the lifetime of the
/// assembly").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobalId(pub u64);

/// Rank identifier in the SPMD process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(pub u32);

/// Identifier of the component grid a node/cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

/// Boundary-condition tag carried by a boundary face (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BcTag {
    Solid,
    Interpolation,
    SymmetryX,
    SymmetryY,
    SymmetryZ,
    Irrelevant,
    NotABoundary,
}

/// A single mesh node.
///
/// Invariant (spec.md §3): every local node either is owned (`owner ==
/// this_rank`) or is a ghost mirrored from exactly one owner; this is
/// enforced by the owning `MeshView`, not by the type itself, since a
/// `Node` by itself cannot know "this rank".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub position: Point<f64>,
    pub global_id: GlobalId,
    pub owner: Rank,
    pub component: ComponentId,
    pub bc_tag: Option<BcTag>,
}

impl Node {
    pub fn new(position: Point<f64>, global_id: GlobalId, owner: Rank, component: ComponentId) -> Self {
        Node {
            position,
            global_id,
            owner,
            component,
            bc_tag: None,
        }
    }

    pub fn with_bc_tag(mut self, tag: BcTag) -> Self {
        self.bc_tag = Some(tag);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_builder_sets_bc_tag() {
        let n = Node::new(Point::new(0.0, 0.0, 0.0), GlobalId(1), Rank(0), ComponentId(0))
            .with_bc_tag(BcTag::Solid);
        assert_eq!(n.bc_tag, Some(BcTag::Solid));
    }
}
