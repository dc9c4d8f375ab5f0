use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::mesh::{CellType, ComponentId, GlobalId, MeshView, Rank};

/// A node carried inside a [`VoxelFragment`], re-indexed to a dense local
/// id and annotated with its current wall-distance estimate (spec.md §3,
/// §4.5; grounded on `original_source/yoga/src/VoxelFragment.h`'s
/// `TransferNode`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferNode {
    pub global_id: GlobalId,
    pub position: [f64; 3],
    pub wall_distance: f64,
    pub component: ComponentId,
    pub owner: Rank,
}

/// A cell inside a [`VoxelFragment`], re-indexed to local node ids within
/// the same fragment and carrying enough of its origin (owning rank,
/// original local cell id) that a donor found on this cell can be reported
/// back to whoever owns it (spec.md §4.5 step ii).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentCell {
    pub cell_type: CellType,
    pub local_nodes: SmallVec<[u32; 8]>,
    pub component: ComponentId,
    pub owner: Rank,
    pub original_cell_id: u32,
}

/// A serializable, self-contained mesh sub-region shipped between ranks
/// during balancing and donor search (spec.md §3, §4.5).
///
/// Invariant: every `FragmentCell::local_nodes` index is in range for
/// `nodes` — enforced by construction, since [`VoxelFragment::build`] is
/// the only way to populate a fragment from a [`MeshView`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoxelFragment {
    pub nodes: Vec<TransferNode>,
    pub tets: Vec<FragmentCell>,
    pub pyramids: Vec<FragmentCell>,
    pub prisms: Vec<FragmentCell>,
    pub hexes: Vec<FragmentCell>,
}

impl VoxelFragment {
    /// Builds a fragment from `cell_ids` (local ids into `view`), collecting
    /// only the nodes those cells reference into a dense re-indexed table
    /// and separating cells by type into four contiguous arrays (spec.md
    /// §4.5 steps i-iii).
    pub fn build<V: MeshView>(view: &V, node_wall_distance: &[f64], cell_ids: &[usize]) -> VoxelFragment {
        let mut local_index: FxHashMap<usize, u32> = FxHashMap::default();
        let mut nodes = Vec::new();
        let mut tets = Vec::new();
        let mut pyramids = Vec::new();
        let mut prisms = Vec::new();
        let mut hexes = Vec::new();
        let this_rank = view.this_rank();

        for &cell_id in cell_ids {
            let cell = view.cell(cell_id);
            let mut component = None;
            let mapped_nodes: SmallVec<[u32; 8]> = cell
                .nodes
                .iter()
                .map(|&local_node| {
                    let local_node = local_node as usize;
                    component.get_or_insert_with(|| view.component(local_node));
                    *local_index.entry(local_node).or_insert_with(|| {
                        let idx = nodes.len() as u32;
                        nodes.push(TransferNode {
                            global_id: view.global_id(local_node),
                            position: view.position_real(local_node),
                            wall_distance: node_wall_distance[local_node],
                            component: view.component(local_node),
                            owner: view.owner(local_node),
                        });
                        idx
                    })
                })
                .collect();

            let fragment_cell = FragmentCell {
                cell_type: cell.cell_type,
                local_nodes: mapped_nodes,
                component: component.expect("a cell always has at least one node"),
                owner: this_rank,
                original_cell_id: cell_id as u32,
            };

            match fragment_cell.cell_type {
                CellType::Tet => tets.push(fragment_cell),
                CellType::Pyramid => pyramids.push(fragment_cell),
                CellType::Prism => prisms.push(fragment_cell),
                CellType::Hex => hexes.push(fragment_cell),
            }
        }

        VoxelFragment {
            nodes,
            tets,
            pyramids,
            prisms,
            hexes,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn cell_count(&self) -> usize {
        self.tets.len() + self.pyramids.len() + self.prisms.len() + self.hexes.len()
    }

    /// Every cell in the fragment, regardless of type, in no particular
    /// order — used by the donor finder and distance calculator to group
    /// cells by `(fragment, component)` (spec.md §4.7, §4.8).
    pub fn cells(&self) -> impl Iterator<Item = &FragmentCell> {
        self.tets
            .iter()
            .chain(self.pyramids.iter())
            .chain(self.prisms.iter())
            .chain(self.hexes.iter())
    }

    pub fn cell_vertex_positions(&self, cell: &FragmentCell) -> SmallVec<[[f64; 3]; 8]> {
        cell.local_nodes.iter().map(|&n| self.nodes[n as usize].position).collect()
    }

    /// Encodes this fragment for inter-rank transfer (SPEC_FULL.md §B:
    /// `bincode` for opaque exchange buffers). Pack/unpack round-trip
    /// byte-identically regardless of which rank built/received the
    /// fragment (spec.md §4.5, assuming a common endianness as the spec
    /// names explicitly).
    pub fn pack(&self) -> Vec<u8> {
        bincode::serialize(self).expect("VoxelFragment serialization cannot fail")
    }

    pub fn unpack(bytes: &[u8]) -> VoxelFragment {
        bincode::deserialize(bytes).expect("malformed VoxelFragment wire payload")
    }
}
