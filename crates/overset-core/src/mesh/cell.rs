use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::node::GlobalId;

/// A mesh cell: a tuple of 4/5/6/8 node indices (spec.md §3).
///
/// `SmallVec<[u32; 8]>` avoids a heap allocation per cell for every
/// supported type, the way the teacher favors dense contiguous storage over
/// pointer-linked structures (see mesh/element_block.rs for the same
/// "no per-element Box" texture, ndarray-backed instead of SmallVec-backed
/// here because the fragment needs cells of mixed types in flat arrays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Tet,
    Pyramid,
    Prism,
    Hex,
}

impl CellType {
    pub fn node_count(self) -> usize {
        match self {
            CellType::Tet => 4,
            CellType::Pyramid => 5,
            CellType::Prism => 6,
            CellType::Hex => 8,
        }
    }

    pub fn from_node_count(n: usize) -> Option<Self> {
        match n {
            4 => Some(CellType::Tet),
            5 => Some(CellType::Pyramid),
            6 => Some(CellType::Prism),
            8 => Some(CellType::Hex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    /// Local node indices into whatever node table owns this cell (a
    /// `MeshView` or a `VoxelFragment`).
    pub nodes: SmallVec<[u32; 8]>,
}

impl Cell {
    pub fn new(cell_type: CellType, nodes: impl Into<SmallVec<[u32; 8]>>) -> Self {
        let nodes = nodes.into();
        debug_assert_eq!(nodes.len(), cell_type.node_count());
        Cell { cell_type, nodes }
    }

    /// Derived ownership: the owner of the node with the lowest global id in
    /// the cell (spec.md §3).
    pub fn owner_by_lowest_global_id(&self, global_ids_of_local_nodes: &[GlobalId]) -> usize {
        self.nodes
            .iter()
            .map(|&n| n as usize)
            .min_by_key(|&local| global_ids_of_local_nodes[local].0)
            .expect("a cell always has at least one node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_type_node_counts_round_trip() {
        for ct in [CellType::Tet, CellType::Pyramid, CellType::Prism, CellType::Hex] {
            assert_eq!(CellType::from_node_count(ct.node_count()), Some(ct));
        }
    }

    #[test]
    fn owner_is_the_lowest_global_id_node() {
        let cell = Cell::new(CellType::Tet, SmallVec::from_slice(&[0, 1, 2, 3]));
        let gids = [GlobalId(50), GlobalId(3), GlobalId(80), GlobalId(10)];
        assert_eq!(cell.owner_by_lowest_global_id(&gids), 1);
    }
}
