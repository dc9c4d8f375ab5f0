use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::balancer::FragmentPackage;
use crate::comm::ProcessGroup;
use crate::geometry::Extent;
use crate::interp;
use crate::mesh::{CellType, ComponentId, GlobalId, Rank};
use crate::spatial::{Octree, OctreePayload};

/// A query point a receptor owner wants resolved against every other
/// component's cells (spec.md §4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryPoint {
    pub receptor_owner: Rank,
    pub receptor_local_id: u32,
    pub global_id: GlobalId,
    pub position: [f64; 3],
    pub source_component: ComponentId,
    pub wall_distance: f64,
}

/// One cell that contains a query point, reported back toward the
/// receptor owner (spec.md §4.7 candidate donor record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorCandidate {
    pub component: ComponentId,
    pub owner: Rank,
    pub owner_local_cell_id: u32,
    pub cell_type: CellType,
    pub interpolated_wall_distance: f64,
}

/// Every candidate donor found for one query point, still addressed to the
/// rank that owns the receptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub receptor_owner: Rank,
    pub receptor_local_id: u32,
    pub global_id: GlobalId,
    pub candidates: Vec<DonorCandidate>,
}

struct CellEntry {
    component: ComponentId,
    owner: Rank,
    owner_local_cell_id: u32,
    cell_type: CellType,
    vertices: SmallVec<[[f64; 3]; 8]>,
    vertex_wall_distance: SmallVec<[f64; 8]>,
}

impl OctreePayload for CellEntry {
    fn extent(&self) -> Extent {
        Extent::from_points(self.vertices.iter().copied()).expect("cell always has vertices")
    }

    fn closest_point(&self, q: [f64; 3]) -> [f64; 3] {
        // Containment-only payload: the donor finder never ranks cells by
        // distance, only by "does this extent overlap the query point".
        q
    }
}

/// Per-rank donor search structure built from the fragments received from
/// the fragment balancer (spec.md §4.7).
///
/// Cells are grouped by component id and indexed in one extent tree per
/// component. spec.md describes one tree per `(fragment, component)` pair;
/// merging same-component fragments into a single tree answers the same
/// "which cells overlap p" query (the finer split only matters for
/// parallelizing the tree *build* across fragments, a concern this crate's
/// sequential-within-a-rank model does not have).
pub struct DonorFinder {
    trees: Vec<(ComponentId, Octree<CellEntry>)>,
    bounding_box: Extent,
}

impl DonorFinder {
    pub fn build(fragments: &[FragmentPackage]) -> Self {
        let mut by_component: FxHashMap<ComponentId, Vec<CellEntry>> = FxHashMap::default();
        let mut bounding_box: Option<Extent> = None;

        for package in fragments {
            let fragment = &package.fragment;
            for cell in fragment.cells() {
                let vertices: SmallVec<[[f64; 3]; 8]> = fragment.cell_vertex_positions(cell);
                let vertex_wall_distance: SmallVec<[f64; 8]> = cell
                    .local_nodes
                    .iter()
                    .map(|&n| fragment.nodes[n as usize].wall_distance)
                    .collect();
                let entry = CellEntry {
                    component: cell.component,
                    owner: cell.owner,
                    owner_local_cell_id: cell.original_cell_id,
                    cell_type: cell.cell_type,
                    vertices,
                    vertex_wall_distance,
                };
                let extent = entry.extent();
                bounding_box = Some(match bounding_box {
                    Some(mut b) => {
                        b.engulf(extent);
                        b
                    }
                    None => extent,
                });
                by_component.entry(cell.component).or_default().push(entry);
            }
        }

        let trees = by_component
            .into_iter()
            .map(|(component, entries)| (component, Octree::build(entries)))
            .collect();

        DonorFinder {
            trees,
            bounding_box: bounding_box.unwrap_or(Extent::new([0.0; 3], [0.0; 3])),
        }
    }

    pub fn bounding_box(&self) -> Extent {
        self.bounding_box
    }

    pub fn is_empty(&self) -> bool {
        self.trees.iter().all(|(_, t)| t.is_empty())
    }

    /// Runs every query point against every component tree other than its
    /// own source component, producing one report per point that found at
    /// least one donor (spec.md §4.7: "For each (fragment, component) with
    /// component != p.component, retrieve ... filter ... produce a
    /// candidate donor record").
    pub fn query(&self, points: &[QueryPoint]) -> Vec<CandidateReport> {
        points
            .iter()
            .filter_map(|p| {
                let mut candidates = Vec::new();
                for (component, tree) in &self.trees {
                    if *component == p.source_component {
                        continue;
                    }
                    let probe = Extent::new(p.position, p.position);
                    for idx in tree.query_overlapping(&probe) {
                        let entry = &tree.payload()[idx];
                        if !interp::contains_point(entry.cell_type, &entry.vertices, p.position) {
                            continue;
                        }
                        let interpolated_wall_distance =
                            interp::least_squares_interpolate(&entry.vertices, &entry.vertex_wall_distance, p.position);
                        candidates.push(DonorCandidate {
                            component: *component,
                            owner: entry.owner,
                            owner_local_cell_id: entry.owner_local_cell_id,
                            cell_type: entry.cell_type,
                            interpolated_wall_distance,
                        });
                    }
                }
                if candidates.is_empty() {
                    None
                } else {
                    Some(CandidateReport {
                        receptor_owner: p.receptor_owner,
                        receptor_local_id: p.receptor_local_id,
                        global_id: p.global_id,
                        candidates,
                    })
                }
            })
            .collect()
    }
}

/// Gathers every rank's donor-finder bounding box to `root` and broadcasts
/// the full set back out — the "overlap detector" of spec.md §4.7 that
/// decides which ranks a query point should be routed to.
fn all_bounding_boxes<P: ProcessGroup>(process_group: &P, local: Extent, root: Rank) -> Vec<Extent> {
    let gathered = process_group.gather(std::slice::from_ref(&local), root);
    let mut encoded = if process_group.rank() == root {
        serde_json::to_string(&gathered.into_iter().flatten().collect::<Vec<Extent>>())
            .expect("bounding box list always serializes")
    } else {
        String::new()
    };
    process_group.broadcast(&mut encoded, root);
    serde_json::from_str(&encoded).expect("broadcast bounding box payload must round-trip")
}

const DEFAULT_QUERY_CHUNK_SIZE: usize = 50_000;

/// Runs the full two-hop exchange of spec.md §4.7 for one round of query
/// points: route each point to every rank whose bounding box could contain
/// it, query locally, then ship candidate reports back to the receptor
/// owner and merge per global id.
pub fn run_distributed_query<P: ProcessGroup>(
    process_group: &P,
    finder: &DonorFinder,
    local_query_points: &[QueryPoint],
) -> Vec<CandidateReport> {
    let root = Rank(0);
    let boxes = all_bounding_boxes(process_group, finder.bounding_box(), root);

    let mut outgoing_points: BTreeMap<Rank, Vec<QueryPoint>> = BTreeMap::new();
    for &p in local_query_points {
        for (rank_idx, bbox) in boxes.iter().enumerate() {
            if bbox.contains_point(p.position) {
                outgoing_points.entry(Rank(rank_idx as u32)).or_default().push(p);
            }
        }
    }
    let incoming_points = process_group.exchange(outgoing_points);

    let mut outgoing_reports: BTreeMap<Rank, Vec<CandidateReport>> = BTreeMap::new();
    for (_sender, points) in incoming_points {
        for report in finder.query(&points) {
            outgoing_reports.entry(report.receptor_owner).or_default().push(report);
        }
    }
    let incoming_reports = process_group.exchange(outgoing_reports);

    merge_reports(incoming_reports.into_values().flatten())
}

/// Splits `local_query_points` into rounds of at most `chunk_size` so peak
/// exchange-buffer memory stays bounded (spec.md §4.7 "optional chunking").
///
/// Every rank must be called with the same `chunk_size`: the round count is
/// derived independently per rank from its own point count, so a caller
/// that wants exact lockstep across ranks (required once this runs over a
/// real `MpiGroup`) should chunk against the global max point count rather
/// than each rank's own, e.g. via `process_group.parallel_max_i64`.
pub fn run_distributed_query_chunked<P: ProcessGroup>(
    process_group: &P,
    finder: &DonorFinder,
    local_query_points: &[QueryPoint],
    chunk_size: usize,
) -> Vec<CandidateReport> {
    let chunk_size = chunk_size.max(1);
    if local_query_points.len() <= chunk_size {
        return run_distributed_query(process_group, finder, local_query_points);
    }
    let rounds = local_query_points
        .chunks(chunk_size)
        .map(|chunk| run_distributed_query(process_group, finder, chunk));
    merge_reports(rounds.flatten())
}

pub fn default_query_chunk_size() -> usize {
    DEFAULT_QUERY_CHUNK_SIZE
}

fn merge_reports(reports: impl IntoIterator<Item = CandidateReport>) -> Vec<CandidateReport> {
    let mut merged: FxHashMap<GlobalId, CandidateReport> = FxHashMap::default();
    for report in reports {
        merged
            .entry(report.global_id)
            .and_modify(|existing| existing.candidates.extend(report.candidates.clone()))
            .or_insert(report);
    }
    merged.into_values().collect()
}
