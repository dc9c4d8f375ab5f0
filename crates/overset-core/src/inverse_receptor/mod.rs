//! Inverse-receptor exchange (spec.md §4.10): each confirmed `FringeNode`
//! ships its donor cell id and coordinates to the donor-owning rank, which
//! computes interpolation weights and replies with the donor point set.
//!
//! Grounded on `donor::finder::run_distributed_query`'s two-hop
//! `ProcessGroup::exchange` shape, routed the other direction: the
//! *receptor* owner is now the one asking, and the *donor* owner answers
//! using its own [`crate::mesh::MeshView`] to read the donor cell's nodes.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::comm::ProcessGroup;
use crate::error::OversetResult;
use crate::interp::{self, WeightCalculator};
use crate::mesh::{CellType, GlobalId, MeshView, Rank};

/// One receptor's request to a donor-owning rank (spec.md §4.10 "ships
/// {donor cell id, receptor local id, receptor coordinates}").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverseReceptorRequest {
    pub requester: Rank,
    pub receptor_local_id: u32,
    pub receptor_global_id: GlobalId,
    pub donor_owner_local_cell_id: u32,
    pub donor_cell_type: CellType,
    pub position: [f64; 3],
    pub weight_calculator: WeightCalculator,
}

/// The donor-point record of spec.md §3, keyed to the receptor that
/// requested it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorPoint {
    pub receptor_local_id: u32,
    pub receptor_global_id: GlobalId,
    pub donor_local_ids: Vec<u32>,
    pub donor_global_ids: Vec<GlobalId>,
    pub donor_owners: Vec<Rank>,
    pub donor_coordinates: Vec<[f64; 3]>,
    pub weights: Vec<f64>,
}

/// Runs the full §4.10 round trip: requests are routed to their donor
/// owner, the owner reads its local mesh, computes and verifies weights
/// (spec.md §4.3), and the reply is routed back to `requester`.
///
/// `requests_by_donor_owner[owner]` must contain every request this rank
/// wants answered by `owner`. Returns, keyed by the receptor's global id,
/// every [`DonorPoint`] this rank is the requester for. A weight that
/// fails verification is a fatal `OversetError::WeightNonConvergence`
/// (spec.md §7), aborting the whole exchange the same way any other
/// invariant violation does.
pub fn run_inverse_receptor_exchange<P: ProcessGroup, V: MeshView>(
    process_group: &P,
    view: &V,
    requests_by_donor_owner: BTreeMap<Rank, Vec<InverseReceptorRequest>>,
) -> OversetResult<FxHashMap<GlobalId, DonorPoint>> {
    let incoming_requests = process_group.exchange(requests_by_donor_owner);

    let mut outgoing_replies: BTreeMap<Rank, Vec<DonorPoint>> = BTreeMap::new();
    for (_sender, requests) in incoming_requests {
        for request in requests {
            let donor_point = resolve_donor_point(view, &request)?;
            outgoing_replies.entry(request.requester).or_default().push(donor_point);
        }
    }

    let incoming_replies = process_group.exchange(outgoing_replies);
    let mut result = FxHashMap::default();
    for (_owner, points) in incoming_replies {
        for point in points {
            result.insert(point.receptor_global_id, point);
        }
    }
    Ok(result)
}

fn resolve_donor_point<V: MeshView>(view: &V, request: &InverseReceptorRequest) -> OversetResult<DonorPoint> {
    let cell = view.cell(request.donor_owner_local_cell_id as usize);
    let donor_local_ids: Vec<u32> = cell.nodes.to_vec();
    let donor_coordinates: Vec<[f64; 3]> = donor_local_ids.iter().map(|&n| view.position_real(n as usize)).collect();
    let donor_global_ids: Vec<GlobalId> = donor_local_ids.iter().map(|&n| view.global_id(n as usize)).collect();
    let donor_owners: Vec<Rank> = donor_local_ids.iter().map(|&n| view.owner(n as usize)).collect();

    let weights = request
        .weight_calculator
        .weights(Some(request.donor_cell_type), &donor_coordinates, request.position);
    interp::verify_weights(&donor_coordinates, &weights, request.position)?;

    Ok(DonorPoint {
        receptor_local_id: request.receptor_local_id,
        receptor_global_id: request.receptor_global_id,
        donor_local_ids,
        donor_global_ids,
        donor_owners,
        donor_coordinates,
        weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SingleRankGroup;
    use crate::mesh::test_support::UnitTetMesh;

    #[test]
    fn single_rank_round_trip_resolves_weights_for_a_tet() {
        let group = SingleRankGroup::new();
        let mesh = UnitTetMesh::new();

        let request = InverseReceptorRequest {
            requester: Rank(0),
            receptor_local_id: 5,
            receptor_global_id: GlobalId(42),
            donor_owner_local_cell_id: 0,
            donor_cell_type: CellType::Tet,
            position: [0.0, 0.0, 1.0],
            weight_calculator: WeightCalculator::Lagrange,
        };
        let mut requests = BTreeMap::new();
        requests.insert(Rank(0), vec![request]);

        let replies = run_inverse_receptor_exchange(&group, &mesh, requests).unwrap();
        let point = &replies[&GlobalId(42)];
        // Seed scenario S1: query (0,0,1) on the unit tet reproduces
        // barycentric weights (0,0,0,1).
        assert_eq!(point.weights.len(), 4);
        assert!((point.weights[3] - 1.0).abs() < 1e-9);
        assert!(point.weights[..3].iter().all(|w| w.abs() < 1e-9));
    }

    #[test]
    fn orphan_receptors_are_never_sent_through_this_exchange() {
        // Orphan policy (spec.md §4.10): orphans carry no donor and so
        // never produce a request in the first place — the driver filters
        // them out before building `requests_by_donor_owner`. Exercised
        // here as "an empty request map yields an empty reply map".
        let group = SingleRankGroup::new();
        let mesh = UnitTetMesh::new();
        let replies = run_inverse_receptor_exchange(&group, &mesh, BTreeMap::new()).unwrap();
        assert!(replies.is_empty());
    }
}
