//! Assembler driver (spec.md §4.11): sequences every other module into one
//! assembly pass over a [`MeshView`] snapshot.
//!
//! Grounded on spec.md §4.11's stage order: fragment balance (§4.6) →
//! donor finder build (§4.7) → wall-distance annotation (§4.8) → donor
//! search / candidate-receptor formation → neighbor-graph attachment →
//! status state machine (§4.9) → prune non-fringe receptors →
//! inverse-receptor exchange (§4.10). The `max-receptors` promotion pass
//! (SPEC_FULL.md §C) runs between the status machine and the prune step,
//! since it only ever *adds* fringe nodes to what the machine already
//! decided.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::balancer;
use crate::comm::ProcessGroup;
use crate::distance;
use crate::donor::{self, DonorFinder, QueryPoint};
use crate::error::OversetResult;
use crate::geometry::Extent;
use crate::holemap::{HoleMap, SymmetryPlane};
use crate::interp::WeightCalculator;
use crate::inverse_receptor::{self, DonorPoint, InverseReceptorRequest};
use crate::mesh::{BcTag, ComponentId, GlobalId, MeshView, Rank};
use crate::status::{self, NodeStatus, Receptor, ReceptorBuilder, StatusInput, StatusMachineConfig};

const DEFAULT_DISTANCE_CHUNK_SIZE: usize = 50_000;

/// Per-component knobs a `MeshView` alone doesn't carry: symmetry planes
/// for the hole map's flood-fill seed filter (spec.md §4.4 step 5) and an
/// optional wall-distance importance weight (spec.md §4.8 step 3, §6
/// `component-grid-importance`).
#[derive(Debug, Clone, Default)]
pub struct ComponentConfig {
    pub symmetry_planes: Vec<SymmetryPlane>,
    pub importance: Option<f64>,
}

/// Tunables for one assembly pass (spec.md §4.11, §6 `yoga.config`).
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub status_machine: StatusMachineConfig,
    pub weight_calculator: WeightCalculator,
    /// §4.6 step 2 `rcb` agglomeration size (default 256).
    pub target_blob_size: usize,
    /// §4.4 `max-hole-map-cells` (default 8 000).
    pub max_hole_map_cells: usize,
    /// Chunk size for the §4.8 distance calculator's surface-point rounds.
    pub distance_chunk_size: usize,
    /// §4.7 "optional chunking" query-point round size (default 50 000).
    pub query_chunk_size: usize,
    pub component_config: BTreeMap<ComponentId, ComponentConfig>,
    /// `yoga.config`'s `max-receptors`: after the status machine settles,
    /// promote `OutNode`s that still carry a donor candidate to
    /// `FringeNode` (spec.md §6; SPEC_FULL.md §C).
    pub max_receptors: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        AssemblerConfig {
            status_machine: StatusMachineConfig::default(),
            weight_calculator: WeightCalculator::Lagrange,
            target_blob_size: 256,
            max_hole_map_cells: 8_000,
            distance_chunk_size: DEFAULT_DISTANCE_CHUNK_SIZE,
            query_chunk_size: donor::default_query_chunk_size(),
            component_config: BTreeMap::new(),
            max_receptors: false,
        }
    }
}

/// Everything a host solver needs back from one assembly pass (spec.md
/// §4.11 "On return: (status vector, receptor map, global-to-local
/// index)").
pub struct AssemblyResult {
    pub statuses: Vec<NodeStatus>,
    /// Resolved donor points for every confirmed (or `max-receptors`
    /// promoted) fringe node, keyed by its global id.
    pub receptors: FxHashMap<GlobalId, DonorPoint>,
    pub global_to_local: FxHashMap<GlobalId, usize>,
}

pub struct AssemblerDriver;

impl AssemblerDriver {
    /// Runs the full pipeline of spec.md §4.11 for this rank's local
    /// partition of `view`, against whatever other ranks are doing the
    /// same through `process_group`.
    pub fn run<P: ProcessGroup, V: MeshView>(process_group: &P, view: &V, config: &AssemblerConfig) -> OversetResult<AssemblyResult> {
        let this_rank = process_group.rank();
        let n = view.node_count();
        tracing::info!(rank = this_rank.0, nodes = n, cells = view.cell_count(), "assembly pass starting");

        let global_ids: Vec<GlobalId> = (0..n).map(|i| view.global_id(i)).collect();
        let positions: Vec<[f64; 3]> = (0..n).map(|i| view.position_real(i)).collect();
        let components: Vec<ComponentId> = (0..n).map(|i| view.component(i)).collect();
        let mut bc_tags: Vec<Option<BcTag>> = vec![None; n];
        for f in view.faces() {
            let face = view.boundary_face(f);
            if face.tag == BcTag::NotABoundary {
                continue;
            }
            for &node in &face.nodes {
                bc_tags[node as usize] = Some(face.tag);
            }
        }
        let global_to_local: FxHashMap<GlobalId, usize> = global_ids.iter().enumerate().map(|(i, &g)| (g, i)).collect();

        let neighbors = status::build_neighbor_graph(view);
        let straddling = status::build_straddling_flags(view);

        // Per-component geometry, agreed on by every rank up front: the
        // overall node extent (drives §4.6 overlap-candidate selection and
        // §4.9 step 4's overlap masks) and the solid-surface extent/points
        // (drives §4.4's hole map and §4.8's distance calculator).
        let mut local_component_extent: BTreeMap<ComponentId, Extent> = BTreeMap::new();
        for i in 0..n {
            local_component_extent
                .entry(components[i])
                .and_modify(|e| e.engulf_point(positions[i]))
                .or_insert_with(|| Extent::new(positions[i], positions[i]));
        }
        let component_extents = gather_extents_by_component(process_group, &local_component_extent);

        let mut local_solid_body_extent: BTreeMap<ComponentId, Extent> = BTreeMap::new();
        let mut local_solid_face_extents: BTreeMap<ComponentId, Vec<Extent>> = BTreeMap::new();
        let mut local_solid_points: BTreeMap<ComponentId, Vec<[f64; 3]>> = BTreeMap::new();
        for f in view.faces() {
            let face = view.boundary_face(f);
            if !face.is_solid() {
                continue;
            }
            let pts: Vec<[f64; 3]> = face.nodes.iter().map(|&nd| positions[nd as usize]).collect();
            let component = components[face.nodes[0] as usize];
            let extent = Extent::from_points(pts.iter().copied()).expect("boundary face always has nodes");
            local_solid_body_extent
                .entry(component)
                .and_modify(|e| e.engulf(extent))
                .or_insert(extent);
            local_solid_face_extents.entry(component).or_default().push(extent);
            local_solid_points.entry(component).or_default().extend(pts);
        }
        let solid_body_extents = gather_extents_by_component(process_group, &local_solid_body_extent);

        // §4.4: one hole map per solid-surface component, in a
        // deterministic (BTreeMap) order so every rank calls
        // `HoleMap::build`'s collective sync the same number of times.
        tracing::debug!(components = solid_body_extents.len(), "building hole maps");
        let mut hole_maps = Vec::with_capacity(solid_body_extents.len());
        for (&component, &body_extent) in &solid_body_extents {
            let symmetry_planes = config
                .component_config
                .get(&component)
                .map(|c| c.symmetry_planes.clone())
                .unwrap_or_default();
            let local_faces = local_solid_face_extents.get(&component).cloned().unwrap_or_default();
            hole_maps.push(HoleMap::build(
                process_group,
                component,
                body_extent,
                config.max_hole_map_cells,
                &local_faces,
                &symmetry_planes,
            ));
        }

        // §4.8: wall distance per node, from each node's own component's
        // solid surface only, optionally rescaled by grid importance.
        let importance: BTreeMap<ComponentId, f64> = config
            .component_config
            .iter()
            .filter_map(|(&c, cc)| cc.importance.map(|v| (c, v)))
            .collect();
        let importance_ref = if importance.is_empty() { None } else { Some(&importance) };
        tracing::debug!("computing wall distances");
        let wall_distance = distance::compute_wall_distances(
            process_group,
            &local_solid_points,
            &components,
            &positions,
            config.distance_chunk_size,
            importance_ref,
        );

        // §4.6: balance the cells whose extent overlaps another
        // component's extent into work-balanced per-rank fragments.
        let overlap_candidate_cells: Vec<usize> = view
            .cells()
            .filter(|&c| {
                let cell = view.cell(c);
                let own = components[cell.nodes[0] as usize];
                let extent = view.cell_extent(c);
                component_extents.iter().any(|(&comp, ext)| comp != own && ext.intersects(&extent))
            })
            .collect();
        tracing::debug!(overlap_candidates = overlap_candidate_cells.len(), "balancing overlap fragments");
        let fragments = balancer::balance_fragments_with_target(process_group, view, &wall_distance, &overlap_candidate_cells, config.target_blob_size);

        // §4.7: build the per-rank donor search structure and run the
        // distributed donor query for every uniquely-owned received node.
        let finder = DonorFinder::build(&fragments);
        let mut query_points = Vec::new();
        for package in &fragments {
            for (i, node) in package.fragment.nodes.iter().enumerate() {
                if package.uniquely_owned[i] {
                    query_points.push(QueryPoint {
                        receptor_owner: node.owner,
                        receptor_local_id: i as u32,
                        global_id: node.global_id,
                        position: node.position,
                        source_component: node.component,
                        wall_distance: node.wall_distance,
                    });
                }
            }
        }
        tracing::debug!(query_points = query_points.len(), "running distributed donor search");
        let reports = donor::run_distributed_query_chunked(process_group, &finder, &query_points, config.query_chunk_size);

        // Candidate-receptor formation: collate reports into a keyed map,
        // then attach each receptor's local node-neighbor list (spec.md
        // §4.7 "augments each Receptor with its local node neighbors").
        let mut builder = ReceptorBuilder::new();
        for report in reports {
            if let Some(&local) = global_to_local.get(&report.global_id) {
                builder.insert_node(report.global_id, local, wall_distance[local]);
                builder.attach_neighbors(report.global_id, neighbors[local].clone());
                builder.extend_candidates(report);
            }
        }
        let receptors = builder.compact();

        // §4.9: the sixteen-step status state machine.
        let status_input = StatusInput {
            global_ids: &global_ids,
            positions: &positions,
            components: &components,
            bc_tags: &bc_tags,
            neighbors: &neighbors,
            straddling: &straddling,
        };
        tracing::debug!("running status state machine");
        let (mut statuses, surviving_receptors) =
            status::run_status_machine(process_group, view, &config.status_machine, &status_input, &hole_maps, &component_extents, receptors)?;

        // `max-receptors` (spec.md §6, SPEC_FULL.md §C): promote any
        // surviving `OutNode` that still carries a donor candidate to
        // `FringeNode`, then re-sync ghosts since this is itself a
        // per-node write.
        if config.max_receptors {
            let mut promoted = 0usize;
            for r in &surviving_receptors {
                if statuses[r.local_node] == NodeStatus::OutNode && !r.candidates.is_empty() {
                    statuses[r.local_node] = NodeStatus::FringeNode;
                    promoted += 1;
                }
            }
            if promoted > 0 {
                tracing::debug!(promoted, "max-receptors promoted out-nodes to fringe");
            }
            status::sync_ghosts(process_group, &global_ids, &mut statuses);
        }

        // Prune to confirmed fringe nodes before spending a round-trip on
        // weights (spec.md §4.9 "the final FringeNode set drives the
        // inverse-receptor phase").
        let fringe_receptors: Vec<Receptor> = surviving_receptors.into_iter().filter(|r| statuses[r.local_node] == NodeStatus::FringeNode).collect();

        // §4.10: pick one donor cell per fringe receptor — the candidate
        // with the smallest interpolated wall distance, ties broken by
        // (component, owner, cell id) for determinism (testable property 1)
        // — and ship it to the donor owner for weight resolution.
        let mut requests_by_owner: BTreeMap<Rank, Vec<InverseReceptorRequest>> = BTreeMap::new();
        for r in &fringe_receptors {
            let Some(best) = r.candidates.iter().min_by(|a, b| {
                a.interpolated_wall_distance
                    .partial_cmp(&b.interpolated_wall_distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.component.0.cmp(&b.component.0))
                    .then_with(|| a.owner.0.cmp(&b.owner.0))
                    .then_with(|| a.owner_local_cell_id.cmp(&b.owner_local_cell_id))
            }) else {
                // A FringeNode always has at least one candidate donor —
                // that is exactly what steps 11/13 required to reach this
                // status — but treat an empty list defensively as an
                // orphan-shaped no-op rather than panicking.
                continue;
            };
            requests_by_owner.entry(best.owner).or_default().push(InverseReceptorRequest {
                requester: this_rank,
                receptor_local_id: r.local_node as u32,
                receptor_global_id: r.global_id,
                donor_owner_local_cell_id: best.owner_local_cell_id,
                donor_cell_type: best.cell_type,
                position: positions[r.local_node],
                weight_calculator: config.weight_calculator,
            });
        }
        tracing::debug!(requests = requests_by_owner.values().map(Vec::len).sum::<usize>(), "running inverse-receptor exchange");
        let donor_points = inverse_receptor::run_inverse_receptor_exchange(process_group, view, requests_by_owner)?;

        tracing::info!(
            rank = this_rank.0,
            fringe = fringe_receptors.len(),
            resolved = donor_points.len(),
            "assembly pass complete"
        );

        Ok(AssemblyResult {
            statuses,
            receptors: donor_points,
            global_to_local,
        })
    }
}

/// Gathers every rank's local per-component extent to root, reduces with
/// `Extent::engulf`, and broadcasts the merged table back out — the same
/// gather/broadcast-a-`serde_json`-string idiom `donor::finder`'s
/// `all_bounding_boxes` and `status::machine`'s ghost sync use, applied to
/// a `ComponentId`-keyed table instead of a per-rank or per-node one.
fn gather_extents_by_component<P: ProcessGroup>(process_group: &P, local: &BTreeMap<ComponentId, Extent>) -> BTreeMap<ComponentId, Extent> {
    let root = Rank(0);
    let local_entries: Vec<(ComponentId, Extent)> = local.iter().map(|(&c, &e)| (c, e)).collect();
    let gathered = process_group.gather(&local_entries, root);
    let mut encoded = if process_group.rank() == root {
        let mut merged: BTreeMap<ComponentId, Extent> = BTreeMap::new();
        for (component, extent) in gathered.into_iter().flatten() {
            merged.entry(component).and_modify(|e| e.engulf(extent)).or_insert(extent);
        }
        serde_json::to_string(&merged.into_iter().collect::<Vec<(ComponentId, Extent)>>()).expect("component extent table always serializes")
    } else {
        String::new()
    };
    process_group.broadcast(&mut encoded, root);
    let merged: Vec<(ComponentId, Extent)> = serde_json::from_str(&encoded).expect("broadcast component extent table must round-trip");
    merged.into_iter().collect()
}
