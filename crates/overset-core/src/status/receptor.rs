use rustc_hash::FxHashMap;

use crate::donor::{CandidateReport, DonorCandidate};
use crate::mesh::GlobalId;

/// A receptor candidate's accumulated state: its local node id, known wall
/// distance, every candidate donor found for it so far, and (once attached
/// by the caller) its local node-neighbor list for the status machine
/// (spec.md §4.7 "augments each Receptor with its local node neighbors").
#[derive(Debug, Clone)]
pub struct Receptor {
    pub global_id: GlobalId,
    pub local_node: usize,
    pub wall_distance: f64,
    pub candidates: Vec<DonorCandidate>,
    pub neighbors: Vec<usize>,
}

/// Accumulates [`CandidateReport`]s into a keyed map by global id — so
/// repeated query rounds or chunked donor search just extend the same
/// entry instead of producing duplicates — then compacts into a plain
/// `Vec` once collection is complete (spec.md §9 "Receptor records ...
/// build them in a keyed map ... then compact").
#[derive(Debug, Default)]
pub struct ReceptorBuilder {
    entries: FxHashMap<GlobalId, Receptor>,
}

impl ReceptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node as a receptor candidate, to be filled in by later
    /// calls to [`ReceptorBuilder::extend_candidates`] /
    /// [`ReceptorBuilder::attach_neighbors`]. Idempotent: a node already
    /// registered keeps its first-recorded wall distance.
    pub fn insert_node(&mut self, global_id: GlobalId, local_node: usize, wall_distance: f64) {
        self.entries.entry(global_id).or_insert_with(|| Receptor {
            global_id,
            local_node,
            wall_distance,
            candidates: Vec::new(),
            neighbors: Vec::new(),
        });
    }

    pub fn extend_candidates(&mut self, report: CandidateReport) {
        if let Some(r) = self.entries.get_mut(&report.global_id) {
            r.candidates.extend(report.candidates);
        }
    }

    pub fn attach_neighbors(&mut self, global_id: GlobalId, neighbors: Vec<usize>) {
        if let Some(r) = self.entries.get_mut(&global_id) {
            r.neighbors = neighbors;
        }
    }

    pub fn compact(self) -> Vec<Receptor> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{ComponentId, Rank};

    fn candidate(component: u32) -> DonorCandidate {
        DonorCandidate {
            component: ComponentId(component),
            owner: Rank(0),
            owner_local_cell_id: 0,
            cell_type: crate::mesh::CellType::Tet,
            interpolated_wall_distance: 1.0,
        }
    }

    #[test]
    fn repeated_reports_for_the_same_node_accumulate() {
        let mut builder = ReceptorBuilder::new();
        builder.insert_node(GlobalId(1), 0, 0.5);
        builder.extend_candidates(CandidateReport {
            receptor_owner: Rank(0),
            receptor_local_id: 0,
            global_id: GlobalId(1),
            candidates: vec![candidate(1)],
        });
        builder.extend_candidates(CandidateReport {
            receptor_owner: Rank(0),
            receptor_local_id: 0,
            global_id: GlobalId(1),
            candidates: vec![candidate(2)],
        });
        let receptors = builder.compact();
        assert_eq!(receptors.len(), 1);
        assert_eq!(receptors[0].candidates.len(), 2);
    }
}
