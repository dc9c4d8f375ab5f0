//! Fragment balancer: turns locally owned overlap-candidate cells into a
//! spatially compact, work-balanced set of [`VoxelFragment`]s, one per
//! destination rank (spec.md §4.6).
//!
//! Grounded on `examples/other_examples/manifests/SMoraisDev-coupe`'s RCB
//! family for the two-level (local blob, then global) bisection shape, and
//! `original_source/yoga/src/VoxelFragment.h`'s affinity bit-vector for the
//! "first-seen wins" uniquely-owned-node bookkeeping of step 4.

mod rcb;

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::comm::ProcessGroup;
use crate::fragment::VoxelFragment;
use crate::mesh::{GlobalId, MeshView, Rank};

const DEFAULT_TARGET_BLOB_SIZE: usize = 256;
const GLOBAL_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobInfo {
    origin_rank: Rank,
    local_blob_id: u32,
    centroid: [f64; 3],
    weight: f64,
}

/// A fragment together with the affinity bit-vector telling its receiving
/// rank which of its nodes it uniquely owns among every destination that
/// received a copy (spec.md §4.6 step 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentPackage {
    pub fragment: VoxelFragment,
    /// Parallel to `fragment.nodes`: true where this destination is the
    /// unique owner of that node.
    pub uniquely_owned: Vec<bool>,
}

/// Runs the full §4.6 pipeline and returns every fragment this rank
/// received, from every source rank that was assigned cells destined here.
pub fn balance_fragments<P: ProcessGroup, V: MeshView>(
    process_group: &P,
    view: &V,
    node_wall_distance: &[f64],
    overlap_candidate_cells: &[usize],
) -> Vec<FragmentPackage> {
    balance_fragments_with_target(process_group, view, node_wall_distance, overlap_candidate_cells, DEFAULT_TARGET_BLOB_SIZE)
}

pub fn balance_fragments_with_target<P: ProcessGroup, V: MeshView>(
    process_group: &P,
    view: &V,
    node_wall_distance: &[f64],
    overlap_candidate_cells: &[usize],
    target_blob_size: usize,
) -> Vec<FragmentPackage> {
    let this_rank = process_group.rank();
    let root = Rank(0);

    // Step 2: local recursive bisection of cell centroids into blobs.
    let centroids: Vec<[f64; 3]> = overlap_candidate_cells.iter().map(|&c| view.cell_extent(c).center()).collect();
    let num_blobs = centroids.len().div_ceil(target_blob_size.max(1)).max(1);
    let blob_of_local_cell = rcb::recursive_bisect(&centroids, &vec![1.0; centroids.len()], num_blobs, GLOBAL_TOLERANCE);

    let mut blob_members: Vec<Vec<usize>> = vec![Vec::new(); num_blobs];
    for (i, &blob) in blob_of_local_cell.iter().enumerate() {
        blob_members[blob].push(overlap_candidate_cells[i]);
    }
    let local_blobs: Vec<BlobInfo> = blob_members
        .iter()
        .enumerate()
        .filter(|(_, members)| !members.is_empty())
        .map(|(blob_id, members)| {
            let mut centroid = [0.0; 3];
            for &cell in members {
                let c = view.cell_extent(cell).center();
                for a in 0..3 {
                    centroid[a] += c[a];
                }
            }
            for a in 0..3 {
                centroid[a] /= members.len() as f64;
            }
            BlobInfo {
                origin_rank: this_rank,
                local_blob_id: blob_id as u32,
                centroid,
                weight: members.len() as f64,
            }
        })
        .collect();

    // Step 3: gather every rank's blobs to the root and globally bisect
    // them into `num_ranks` partitions.
    let gathered = process_group.gather(&local_blobs, root);
    let mut outgoing_partitions: BTreeMap<Rank, Vec<u32>> = BTreeMap::new();
    if process_group.rank() == root {
        let all_blobs: Vec<BlobInfo> = gathered.into_iter().flatten().collect();
        let points: Vec<[f64; 3]> = all_blobs.iter().map(|b| b.centroid).collect();
        let weights: Vec<f64> = all_blobs.iter().map(|b| b.weight).collect();
        let num_ranks = process_group.size();
        let partitions = rcb::recursive_bisect(&points, &weights, num_ranks.max(1), GLOBAL_TOLERANCE);

        let mut per_rank_counts: FxHashMap<Rank, usize> = FxHashMap::default();
        for blob in &all_blobs {
            let slot = per_rank_counts.entry(blob.origin_rank).or_insert(0);
            *slot += 1;
        }
        let mut per_rank_assignments: FxHashMap<Rank, Vec<u32>> = FxHashMap::default();
        for (blob, &part) in all_blobs.iter().zip(partitions.iter()) {
            per_rank_assignments.entry(blob.origin_rank).or_default().push(part as u32);
        }
        for (origin, assignments) in per_rank_assignments {
            outgoing_partitions.insert(origin, assignments);
        }
    }

    // Step 3 (cont'd): ship each rank's own blob-to-target-rank assignment
    // back out. Only the root ever has anything to send here.
    let incoming_partitions = process_group.exchange(outgoing_partitions);
    let my_assignment = incoming_partitions.get(&root).cloned().unwrap_or_default();

    // Map each local cell to its destination rank through its blob.
    let mut blob_destination: Vec<Option<Rank>> = vec![None; num_blobs];
    let mut next = 0usize;
    for (blob_id, members) in blob_members.iter().enumerate() {
        if members.is_empty() {
            continue;
        }
        let dest = my_assignment.get(next).copied().unwrap_or(0);
        blob_destination[blob_id] = Some(Rank(dest));
        next += 1;
    }

    let mut cells_by_destination: BTreeMap<Rank, Vec<usize>> = BTreeMap::new();
    for (i, &blob) in blob_of_local_cell.iter().enumerate() {
        if let Some(dest) = blob_destination[blob] {
            cells_by_destination.entry(dest).or_default().push(overlap_candidate_cells[i]);
        }
    }

    // Step 4: build one fragment per destination, then resolve the
    // affinity bit-vector across all of this rank's outgoing fragments.
    let mut fragments: BTreeMap<Rank, VoxelFragment> = BTreeMap::new();
    for (&dest, cells) in &cells_by_destination {
        fragments.insert(dest, VoxelFragment::build(view, node_wall_distance, cells));
    }

    let mut owner_of_node: FxHashMap<GlobalId, Rank> = FxHashMap::default();
    for (&dest, fragment) in &fragments {
        for node in &fragment.nodes {
            owner_of_node.entry(node.global_id).or_insert(dest);
        }
    }

    let mut outgoing: BTreeMap<Rank, Vec<FragmentPackage>> = BTreeMap::new();
    for (dest, fragment) in fragments {
        let uniquely_owned = fragment.nodes.iter().map(|n| owner_of_node[&n.global_id] == dest).collect();
        outgoing.insert(dest, vec![FragmentPackage { fragment, uniquely_owned }]);
    }

    // Step 5: all-to-all exchange fragments and affinities.
    let incoming = process_group.exchange(outgoing);
    incoming.into_values().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SingleRankGroup;
    use crate::mesh::test_support::UnitTetMesh;

    #[test]
    fn single_rank_balance_returns_one_fragment_covering_all_cells() {
        let group = SingleRankGroup::new();
        let mesh = UnitTetMesh::new();
        let wall_distance = vec![1.0; mesh.node_count()];
        let received = balance_fragments(&group, &mesh, &wall_distance, &[0]);

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].fragment.cell_count(), 1);
        assert!(received[0].uniquely_owned.iter().all(|&b| b));
    }

    #[test]
    fn empty_candidate_set_yields_no_fragments() {
        let group = SingleRankGroup::new();
        let mesh = UnitTetMesh::new();
        let wall_distance = vec![1.0; mesh.node_count()];
        let received = balance_fragments(&group, &mesh, &wall_distance, &[]);
        assert!(received.is_empty());
    }
}
