use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use super::donor_validity::exchange_donor_validity;
use super::receptor::Receptor;
use super::NodeStatus;
use crate::comm::ProcessGroup;
use crate::error::{OversetError, OversetResult};
use crate::geometry::Extent;
use crate::holemap::HoleMap;
use crate::mesh::{BcTag, ComponentId, GlobalId, MeshView, Rank};
use crate::spatial::CartesianBlock;

/// Tunables for the status state machine (spec.md §4.9, §6).
#[derive(Debug, Clone, Copy)]
pub struct StatusMachineConfig {
    /// Node-neighbor layers a `MandatoryReceptor` mark spreads through
    /// (spec.md §4.9 step 2; `yoga.config` key
    /// `extra-layers-for-interpolation-bcs`, default 1).
    pub extra_layers: usize,
    /// Upper bound on the Cartesian mask built per other component for the
    /// "improve multi-overlap regions" pass (spec.md §4.9 step 4, §9 open
    /// question: historically hard-coded around 1 Mi cells).
    pub max_overlap_mask_cells: usize,
}

impl Default for StatusMachineConfig {
    fn default() -> Self {
        StatusMachineConfig {
            extra_layers: 1,
            max_overlap_mask_cells: 1 << 20,
        }
    }
}

/// Every per-node array the status machine reads, gathered once up front
/// by the caller (spec.md §4.9's "operates on the receptor list, a
/// per-node neighbor graph, the hole map, and per-component extents").
pub struct StatusInput<'a> {
    pub global_ids: &'a [GlobalId],
    pub positions: &'a [[f64; 3]],
    pub components: &'a [ComponentId],
    pub bc_tags: &'a [Option<BcTag>],
    pub neighbors: &'a [Vec<usize>],
    pub straddling: &'a [bool],
}

/// Builds the node-neighbor graph from cell membership: two nodes are
/// neighbors if they co-occur in at least one cell (spec.md §4.7 "augments
/// each Receptor with its local node neighbors").
pub fn build_neighbor_graph<V: MeshView>(view: &V) -> Vec<Vec<usize>> {
    let mut neighbor_sets: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); view.node_count()];
    for cell_id in view.cells() {
        let cell = view.cell(cell_id);
        for &a in &cell.nodes {
            for &b in &cell.nodes {
                if a != b {
                    neighbor_sets[a as usize].insert(b as usize);
                }
            }
        }
    }
    neighbor_sets.into_iter().map(|s| s.into_iter().collect()).collect()
}

/// Marks every node belonging to a cell whose nodes span more than one
/// component (spec.md §4.9 step 5 "cells straddling two components").
pub fn build_straddling_flags<V: MeshView>(view: &V) -> Vec<bool> {
    let mut straddling = vec![false; view.node_count()];
    for cell_id in view.cells() {
        let cell = view.cell(cell_id);
        let mut cell_components = cell.nodes.iter().map(|&n| view.component(n as usize));
        let first = match cell_components.next() {
            Some(c) => c,
            None => continue,
        };
        if cell_components.any(|c| c != first) {
            for &n in &cell.nodes {
                straddling[n as usize] = true;
            }
        }
    }
    straddling
}

fn sync_i32<P: ProcessGroup>(process_group: &P, global_ids: &[GlobalId], values: &mut [i32]) {
    let root = Rank(0);
    let local: Vec<(GlobalId, i32)> = global_ids.iter().zip(values.iter()).map(|(&g, &v)| (g, v)).collect();
    let gathered = process_group.gather(&local, root);
    let mut encoded = if process_group.rank() == root {
        let mut merged: FxHashMap<GlobalId, i32> = FxHashMap::default();
        for (g, v) in gathered.into_iter().flatten() {
            merged.entry(g).and_modify(|m| *m = (*m).max(v)).or_insert(v);
        }
        serde_json::to_string(&merged.into_iter().collect::<Vec<_>>()).expect("ghost-sync payload always serializes")
    } else {
        String::new()
    };
    process_group.broadcast(&mut encoded, root);
    let merged: Vec<(GlobalId, i32)> = serde_json::from_str(&encoded).expect("broadcast ghost-sync payload must round-trip");
    let lookup: FxHashMap<GlobalId, i32> = merged.into_iter().collect();
    for (g, v) in global_ids.iter().zip(values.iter_mut()) {
        if let Some(&r) = lookup.get(g) {
            *v = r;
        }
    }
}

/// Gather-max over ghost copies, scattered back to every rank (spec.md
/// §4.9 "All per-node writes are followed by a sync across the ghost
/// pattern"), keyed by global id the way `donor::finder`'s bounding-box
/// exchange is keyed by rank.
pub fn sync_ghosts<P: ProcessGroup>(process_group: &P, global_ids: &[GlobalId], statuses: &mut [NodeStatus]) {
    let mut encoded: Vec<i32> = statuses.iter().map(|s| s.sync_rank()).collect();
    sync_i32(process_group, global_ids, &mut encoded);
    for (s, r) in statuses.iter_mut().zip(encoded) {
        *s = NodeStatus::from_sync_rank(r);
    }
}

fn sync_bools<P: ProcessGroup>(process_group: &P, global_ids: &[GlobalId], flags: &mut [bool]) {
    let mut encoded: Vec<i32> = flags.iter().map(|&b| i32::from(b)).collect();
    sync_i32(process_group, global_ids, &mut encoded);
    for (b, r) in flags.iter_mut().zip(encoded) {
        *b = r != 0;
    }
}

/// A Cartesian mask of where a component's `MandatoryReceptor` nodes live,
/// built once per other component (spec.md §4.9 step 4).
struct OverlapMask {
    component: ComponentId,
    block: CartesianBlock,
    occupied: Vec<bool>,
}

impl OverlapMask {
    fn build(component: ComponentId, extent: Extent, max_cells: usize, positions: impl Iterator<Item = [f64; 3]>) -> Self {
        let block = CartesianBlock::generate(extent, max_cells);
        let mut occupied = vec![false; block.cell_count()];
        for p in positions {
            if let Some(id) = block.containing_cell_id(p) {
                occupied[id] = true;
            }
        }
        OverlapMask { component, block, occupied }
    }

    fn overlaps(&self, e: &Extent) -> bool {
        if !self.block.extent().intersects(e) {
            return false;
        }
        self.block.cells_overlapping(e).into_iter().any(|id| self.occupied[id])
    }
}

/// Runs the sixteen-step status state machine of spec.md §4.9 over one
/// rank's local nodes, synchronizing ghosts after every per-node write.
///
/// `receptors` is the compacted donor-candidate list from the donor
/// search/receptor builder (spec.md §4.7), keyed internally by local node
/// id. `hole_maps` holds one [`HoleMap`] per solid-surface component
/// present anywhere in the assembly; `component_extents` is every
/// component's global (all-rank) bounding box, used to size each
/// [`OverlapMask`].
///
/// Returns the final per-node status vector and every `receptors` entry
/// that carried at least one donor candidate through to termination,
/// whatever its final status. The caller (the assembler driver) is
/// expected to filter to `FringeNode` for the inverse-receptor phase
/// (spec.md §4.9 "After the machine terminates, the final FringeNode set
/// drives the inverse-receptor phase") and may additionally consult the
/// `OutNode` entries for the optional `max-receptors` promotion pass
/// (spec.md §6).
#[allow(clippy::too_many_arguments)]
pub fn run_status_machine<P: ProcessGroup, V: MeshView>(
    process_group: &P,
    view: &V,
    config: &StatusMachineConfig,
    input: &StatusInput<'_>,
    hole_maps: &[HoleMap],
    component_extents: &BTreeMap<ComponentId, Extent>,
    receptors: Vec<Receptor>,
) -> OversetResult<(Vec<NodeStatus>, Vec<Receptor>)> {
    let n = view.node_count();
    let mut statuses = vec![NodeStatus::Unknown; n];
    let mut receptor_by_local: FxHashMap<usize, Receptor> = receptors.into_iter().map(|r| (r.local_node, r)).collect();
    let mut donor_valid: FxHashMap<usize, Vec<bool>> = receptor_by_local
        .iter()
        .map(|(&local, r)| (local, vec![true; r.candidates.len()]))
        .collect();

    // Step 1: hole identification.
    let mut is_candidate_hole = vec![false; n];
    for node in 0..n {
        let own_component = input.components[node];
        let pos = input.positions[node];
        is_candidate_hole[node] = hole_maps.iter().any(|hm| {
            hm.component_id() != own_component
                && hm.contains_point(pos)
                && !receptor_by_local
                    .get(&node)
                    .is_some_and(|r| r.candidates.iter().any(|c| c.component == hm.component_id()))
        });
    }
    sync_bools(process_group, input.global_ids, &mut is_candidate_hole);

    // Step 2: mark mandatory receptors, then spread `extra_layers` hops.
    for node in 0..n {
        if input.bc_tags[node] == Some(BcTag::Interpolation) {
            statuses[node] = NodeStatus::MandatoryReceptor;
        }
    }
    for _ in 0..config.extra_layers {
        let frontier: Vec<usize> = (0..n).filter(|&n| statuses[n] == NodeStatus::MandatoryReceptor).collect();
        for node in frontier {
            for &nbr in &input.neighbors[node] {
                if statuses[nbr] != NodeStatus::MandatoryReceptor {
                    statuses[nbr] = NodeStatus::MandatoryReceptor;
                }
            }
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 3: mark hole points Out.
    for node in 0..n {
        if is_candidate_hole[node] {
            statuses[node] = NodeStatus::OutNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 4: improve multi-overlap regions via a per-other-component mask
    // of that component's mandatory receptors.
    let masks: Vec<OverlapMask> = component_extents
        .iter()
        .filter_map(|(&component, &extent)| {
            let positions = (0..n).filter(|&n2| input.components[n2] == component && statuses[n2] == NodeStatus::MandatoryReceptor).map(|n2| input.positions[n2]);
            let positions: Vec<[f64; 3]> = positions.collect();
            if positions.is_empty() {
                return None;
            }
            Some(OverlapMask::build(component, extent, config.max_overlap_mask_cells, positions.into_iter()))
        })
        .collect();
    for node in 0..n {
        if masks.is_empty() {
            break;
        }
        let own_component = input.components[node];
        let has_out_neighbor = input.neighbors[node].iter().any(|&nb| statuses[nb] == NodeStatus::OutNode);
        if has_out_neighbor {
            continue;
        }
        let mut neighborhood = Extent::new(input.positions[node], input.positions[node]);
        for &nb in &input.neighbors[node] {
            neighborhood.engulf_point(input.positions[nb]);
        }
        if masks.iter().any(|m| m.component != own_component && m.overlaps(&neighborhood)) {
            statuses[node] = NodeStatus::InNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 5: mark nodes of straddling cells In.
    for node in 0..n {
        if input.straddling[node] {
            statuses[node] = NodeStatus::InNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 6: mark surface (Solid) nodes In.
    for node in 0..n {
        if input.bc_tags[node] == Some(BcTag::Solid) {
            statuses[node] = NodeStatus::InNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 7: distance criterion.
    for (&node, receptor) in &receptor_by_local {
        let has_out_neighbor = input.neighbors[node].iter().any(|&nb| statuses[nb] == NodeStatus::OutNode);
        let best_donor_distance = receptor.candidates.iter().map(|c| c.interpolated_wall_distance).fold(f64::INFINITY, f64::min);
        if !has_out_neighbor && receptor.wall_distance < best_donor_distance {
            statuses[node] = NodeStatus::InNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 8: mark definite In points.
    for node in 0..n {
        if statuses[node] != NodeStatus::Unknown {
            continue;
        }
        let has_out_neighbor = input.neighbors[node].iter().any(|&nb| statuses[nb] == NodeStatus::OutNode);
        if !has_out_neighbor && !receptor_by_local.contains_key(&node) {
            statuses[node] = NodeStatus::InNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 9: update donor validity by querying each donor's owning rank.
    let mut requested_cells_by_owner: BTreeMap<Rank, Vec<u32>> = BTreeMap::new();
    for receptor in receptor_by_local.values() {
        for candidate in &receptor.candidates {
            requested_cells_by_owner.entry(candidate.owner).or_default().push(candidate.owner_local_cell_id);
        }
    }
    for cells in requested_cells_by_owner.values_mut() {
        cells.sort_unstable();
        cells.dedup();
    }
    let validity = exchange_donor_validity(process_group, view, &statuses, requested_cells_by_owner);
    for (&node, receptor) in &receptor_by_local {
        let valid = donor_valid.get_mut(&node).expect("donor_valid seeded for every receptor");
        for (slot, candidate) in receptor.candidates.iter().enumerate() {
            valid[slot] = *validity.get(&(candidate.owner, candidate.owner_local_cell_id)).unwrap_or(&true);
        }
    }

    // Step 10: candidate receptors.
    for node in 0..n {
        if statuses[node] != NodeStatus::Unknown {
            continue;
        }
        if input.neighbors[node].iter().any(|&nb| statuses[nb] == NodeStatus::InNode) {
            statuses[node] = NodeStatus::ReceptorCandidate;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 11: convert receptor candidates with a valid donor to fringe.
    for node in 0..n {
        if statuses[node] != NodeStatus::ReceptorCandidate {
            continue;
        }
        let has_valid_donor = donor_valid.get(&node).is_some_and(|v| v.iter().any(|&ok| ok));
        if has_valid_donor {
            statuses[node] = NodeStatus::FringeNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 12: reconsider mandatory receptors.
    for (&node, receptor) in &receptor_by_local {
        if statuses[node] != NodeStatus::MandatoryReceptor {
            continue;
        }
        let valid = &donor_valid[&node];
        let best_valid_distance = receptor
            .candidates
            .iter()
            .zip(valid.iter())
            .filter(|(_, &ok)| ok)
            .map(|(c, _)| c.interpolated_wall_distance)
            .fold(f64::INFINITY, f64::min);
        let has_in_neighbor = input.neighbors[node].iter().any(|&nb| statuses[nb] == NodeStatus::InNode);
        if best_valid_distance < receptor.wall_distance && !has_in_neighbor {
            statuses[node] = NodeStatus::OutNode;
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 13: convert remaining mandatory receptors.
    for node in 0..n {
        if statuses[node] != NodeStatus::MandatoryReceptor {
            continue;
        }
        let has_valid_donor = donor_valid.get(&node).is_some_and(|v| v.iter().any(|&ok| ok));
        statuses[node] = if has_valid_donor { NodeStatus::FringeNode } else { NodeStatus::Orphan };
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 14: close out Unknown / remaining ReceptorCandidate.
    for node in 0..n {
        match statuses[node] {
            NodeStatus::Unknown => statuses[node] = NodeStatus::OutNode,
            NodeStatus::ReceptorCandidate => {
                let has_in_neighbor = input.neighbors[node].iter().any(|&nb| statuses[nb] == NodeStatus::InNode);
                let has_out_neighbor = input.neighbors[node].iter().any(|&nb| statuses[nb] == NodeStatus::OutNode);
                statuses[node] = if has_in_neighbor && !has_out_neighbor {
                    NodeStatus::InNode
                } else {
                    NodeStatus::Orphan
                };
            }
            _ => {}
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 15: filter spurious orphans by flood-filling from orphans that
    // sit on an Interpolation boundary through Orphan/InNode neighbors.
    let seeds: Vec<usize> = (0..n)
        .filter(|&n2| statuses[n2] == NodeStatus::Orphan && input.bc_tags[n2] == Some(BcTag::Interpolation))
        .collect();
    let mut visited = vec![false; n];
    let mut stack = seeds;
    while let Some(node) = stack.pop() {
        if visited[node] {
            continue;
        }
        visited[node] = true;
        statuses[node] = NodeStatus::OutNode;
        for &nbr in &input.neighbors[node] {
            if !visited[nbr] && matches!(statuses[nbr], NodeStatus::Orphan | NodeStatus::InNode) {
                stack.push(nbr);
            }
        }
    }
    sync_ghosts(process_group, input.global_ids, &mut statuses);

    // Step 16: sanity check.
    for node in 0..n {
        if matches!(
            statuses[node],
            NodeStatus::Unknown | NodeStatus::MandatoryReceptor | NodeStatus::ReceptorCandidate
        ) {
            return Err(OversetError::invariant_with_ids(
                format!("node terminated in non-terminal status {:?}", statuses[node]),
                vec![input.global_ids[node].0],
            ));
        }
    }
    for cell_id in view.cells() {
        let cell = view.cell(cell_id);
        let has_in = cell.nodes.iter().any(|&nd| statuses[nd as usize] == NodeStatus::InNode);
        let has_out = cell.nodes.iter().any(|&nd| statuses[nd as usize] == NodeStatus::OutNode);
        if has_in && has_out {
            tracing::warn!(cell_id, "cell has both In and Out nodes after status assignment");
        }
    }

    let surviving_receptors: Vec<Receptor> = receptor_by_local.into_values().collect();

    Ok((statuses, surviving_receptors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SingleRankGroup;
    use crate::donor::DonorCandidate;
    use crate::mesh::{CellType, GlobalId};

    /// A five-node graph (a path, node 2 is the hub) with no boundary
    /// conditions and no receptors at all: everything must close out as
    /// `InNode` via step 8 ("no OutNode neighbor, no receptor marker").
    #[test]
    fn isolated_component_with_no_bcs_closes_out_in() {
        let global_ids: Vec<GlobalId> = (0..5).map(|i| GlobalId(i as u64)).collect();
        let positions = vec![[0.0, 0.0, 0.0]; 5];
        let components = vec![ComponentId(0); 5];
        let bc_tags = vec![None; 5];
        let neighbors = vec![vec![1], vec![0, 2], vec![1, 3], vec![2, 4], vec![3]];
        let straddling = vec![false; 5];
        let input = StatusInput {
            global_ids: &global_ids,
            positions: &positions,
            components: &components,
            bc_tags: &bc_tags,
            neighbors: &neighbors,
            straddling: &straddling,
        };
        let mesh = crate::mesh::test_support::UnitTetMesh::new();
        let group = SingleRankGroup::new();
        let config = StatusMachineConfig::default();
        let (statuses, fringe) = run_status_machine(&group, &mesh_with_node_count(&mesh, 5), &config, &input, &[], &BTreeMap::new(), Vec::new()).unwrap();
        assert!(statuses.iter().all(|&s| s == NodeStatus::InNode));
        assert!(fringe.is_empty());
    }

    #[test]
    fn mandatory_receptor_with_valid_donor_becomes_fringe() {
        let global_ids: Vec<GlobalId> = (0..2).map(|i| GlobalId(i as u64)).collect();
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let components = vec![ComponentId(0), ComponentId(0)];
        let bc_tags = vec![Some(BcTag::Interpolation), None];
        let neighbors = vec![vec![1], vec![0]];
        let straddling = vec![false, false];
        let input = StatusInput {
            global_ids: &global_ids,
            positions: &positions,
            components: &components,
            bc_tags: &bc_tags,
            neighbors: &neighbors,
            straddling: &straddling,
        };
        let mesh = crate::mesh::test_support::UnitTetMesh::new();
        let group = SingleRankGroup::new();
        let config = StatusMachineConfig::default();

        let receptor = Receptor {
            global_id: GlobalId(0),
            local_node: 0,
            wall_distance: 1.0,
            candidates: vec![DonorCandidate {
                component: ComponentId(1),
                owner: Rank(0),
                owner_local_cell_id: 0,
                cell_type: CellType::Tet,
                interpolated_wall_distance: 0.5,
            }],
            neighbors: vec![1],
        };

        let (statuses, fringe) =
            run_status_machine(&group, &mesh_with_node_count(&mesh, 2), &config, &input, &[], &BTreeMap::new(), vec![receptor]).unwrap();
        assert_eq!(statuses[0], NodeStatus::FringeNode);
        assert_eq!(fringe.len(), 1);
    }

    /// Seed scenario S6: an interpolation-boundary node with no donor
    /// reaches step 13 as `Orphan`, but step 15's flood filter treats any
    /// orphan sitting on an Interpolation tag as a seed and reclassifies it
    /// (and everything reachable through Orphan/InNode neighbors) to
    /// `OutNode` — it must never surface as a final `Orphan`.
    #[test]
    fn orphan_on_interpolation_boundary_with_no_donor_becomes_out_node() {
        let global_ids: Vec<GlobalId> = (0..1).map(|i| GlobalId(i as u64)).collect();
        let positions = vec![[0.0, 0.0, 0.0]];
        let components = vec![ComponentId(0)];
        let bc_tags = vec![Some(BcTag::Interpolation)];
        let neighbors = vec![Vec::new()];
        let straddling = vec![false];
        let input = StatusInput {
            global_ids: &global_ids,
            positions: &positions,
            components: &components,
            bc_tags: &bc_tags,
            neighbors: &neighbors,
            straddling: &straddling,
        };
        let mesh = crate::mesh::test_support::UnitTetMesh::new();
        let group = SingleRankGroup::new();
        let config = StatusMachineConfig::default();

        let (statuses, fringe) = run_status_machine(&group, &mesh_with_node_count(&mesh, 1), &config, &input, &[], &BTreeMap::new(), Vec::new()).unwrap();
        assert_eq!(statuses[0], NodeStatus::OutNode);
        assert!(fringe.is_empty());
    }

    /// A receptor that never carries an Interpolation tag and never
    /// becomes a `MandatoryReceptor` (no donor-bearing neighbor to spread
    /// from) simply closes out `OutNode` at step 14's "no receptor
    /// marker" fallback — it has no path to `Orphan` at all, since step 13
    /// only ever orphans a `MandatoryReceptor`.
    #[test]
    fn receptor_without_interpolation_tag_closes_out_node() {
        let global_ids: Vec<GlobalId> = (0..1).map(|i| GlobalId(i as u64)).collect();
        let positions = vec![[0.0, 0.0, 0.0]];
        let components = vec![ComponentId(0)];
        let bc_tags = vec![None];
        let neighbors = vec![Vec::new()];
        let straddling = vec![false];
        let input = StatusInput {
            global_ids: &global_ids,
            positions: &positions,
            components: &components,
            bc_tags: &bc_tags,
            neighbors: &neighbors,
            straddling: &straddling,
        };
        let mesh = crate::mesh::test_support::UnitTetMesh::new();
        let group = SingleRankGroup::new();
        let config = StatusMachineConfig::default();

        // A donor candidate exactly as far from the wall as the receptor
        // itself: step 7's "own distance is strictly better" shortcut does
        // not fire, so the node rides all the way to step 14 still
        // `Unknown`; its one donor cell has no `InNode` vertex yet, so step
        // 9 marks the candidate invalid and step 10 never sees an `InNode`
        // neighbor to promote it through.
        let receptor = Receptor {
            global_id: GlobalId(0),
            local_node: 0,
            wall_distance: 1.0,
            candidates: vec![DonorCandidate {
                component: ComponentId(1),
                owner: Rank(0),
                owner_local_cell_id: 0,
                cell_type: CellType::Tet,
                interpolated_wall_distance: 1.0,
            }],
            neighbors: Vec::new(),
        };
        let (statuses, fringe) =
            run_status_machine(&group, &mesh_with_node_count(&mesh, 1), &config, &input, &[], &BTreeMap::new(), vec![receptor]).unwrap();
        assert_eq!(statuses[0], NodeStatus::OutNode);
        // The machine returns every receptor it was seeded with regardless
        // of final status, not just the ones that end up `FringeNode`.
        assert_eq!(fringe.len(), 1);
    }

    /// A tiny stand-in `MeshView` whose node count matches the test input.
    /// Its one cell references node 0 four times over, which is enough for
    /// step 9's donor-validity lookup (it only reads `statuses` at each
    /// node index in the cell) without needing a geometrically real tet.
    fn mesh_with_node_count(_template: &crate::mesh::test_support::UnitTetMesh, n: usize) -> TestMesh {
        TestMesh {
            n,
            cell: crate::mesh::Cell::new(crate::mesh::CellType::Tet, smallvec::smallvec![0, 0, 0, 0]),
        }
    }

    struct TestMesh {
        n: usize,
        cell: crate::mesh::Cell,
    }

    impl MeshView for TestMesh {
        fn node_count(&self) -> usize {
            self.n
        }
        fn cell_count(&self) -> usize {
            1
        }
        fn face_count(&self) -> usize {
            0
        }
        fn position<T: crate::geometry::Scalar>(&self, _local_node: usize) -> crate::geometry::Point<T> {
            crate::geometry::Point::from_real([0.0, 0.0, 0.0])
        }
        fn global_id(&self, local_node: usize) -> GlobalId {
            GlobalId(local_node as u64)
        }
        fn owner(&self, _local_node: usize) -> Rank {
            Rank(0)
        }
        fn component(&self, _local_node: usize) -> ComponentId {
            ComponentId(0)
        }
        fn cell(&self, _local_cell: usize) -> &crate::mesh::Cell {
            &self.cell
        }
        fn boundary_face(&self, _local_face: usize) -> &crate::mesh::BoundaryFace {
            unreachable!("test meshes carry no boundary faces")
        }
        fn this_rank(&self) -> Rank {
            Rank(0)
        }
    }
}
