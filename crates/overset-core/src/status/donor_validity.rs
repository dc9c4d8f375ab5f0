use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::NodeStatus;
use crate::comm::ProcessGroup;
use crate::mesh::{MeshView, Rank};

/// A request for "does donor cell `local_cell_id` (on the rank that owns
/// it) currently have at least one `InNode` vertex" (spec.md §4.9 step 9).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ValidityRequest {
    local_cell_id: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ValidityReply {
    local_cell_id: u32,
    has_in_node: bool,
}

/// Runs the two-hop exchange of spec.md §4.9 step 9: for every donor
/// candidate a rank wants validated, it asks the owning rank whether the
/// donor cell currently has an `InNode` vertex, and the owner answers by
/// looking the cell up in its own [`MeshView`] and current status array.
///
/// `requested_cells_by_owner[owner]` is the set of that owner's local cell
/// ids this rank wants validated. Returns, keyed by `(owner, local_cell_id)`,
/// whether each requested donor cell is currently valid.
///
/// Grounded on the same two-hop `ProcessGroup::exchange` shape as
/// `donor::finder::run_distributed_query` (request routed to the owner,
/// reply routed back to the asker).
pub fn exchange_donor_validity<P: ProcessGroup, V: MeshView>(
    process_group: &P,
    view: &V,
    statuses: &[NodeStatus],
    requested_cells_by_owner: BTreeMap<Rank, Vec<u32>>,
) -> FxHashMap<(Rank, u32), bool> {
    let outgoing_requests: BTreeMap<Rank, Vec<ValidityRequest>> = requested_cells_by_owner
        .into_iter()
        .map(|(owner, cells)| {
            (
                owner,
                cells.into_iter().map(|local_cell_id| ValidityRequest { local_cell_id }).collect(),
            )
        })
        .collect();
    let incoming_requests = process_group.exchange(outgoing_requests);

    let mut outgoing_replies: BTreeMap<Rank, Vec<ValidityReply>> = BTreeMap::new();
    for (asker, requests) in incoming_requests {
        let replies = requests
            .into_iter()
            .map(|req| {
                let has_in_node = view
                    .cell(req.local_cell_id as usize)
                    .nodes
                    .iter()
                    .any(|&n| statuses[n as usize] == NodeStatus::InNode);
                ValidityReply {
                    local_cell_id: req.local_cell_id,
                    has_in_node,
                }
            })
            .collect();
        outgoing_replies.insert(asker, replies);
    }
    let incoming_replies = process_group.exchange(outgoing_replies);

    let mut result = FxHashMap::default();
    for (owner, replies) in incoming_replies {
        for reply in replies {
            result.insert((owner, reply.local_cell_id), reply.has_in_node);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SingleRankGroup;
    use crate::mesh::test_support::UnitTetMesh;

    #[test]
    fn single_rank_validity_query_reflects_local_status() {
        let group = SingleRankGroup::new();
        let mesh = UnitTetMesh::new();
        let mut statuses = vec![NodeStatus::OutNode; mesh.node_count()];
        statuses[1] = NodeStatus::InNode;

        let mut requests = BTreeMap::new();
        requests.insert(Rank(0), vec![0u32]);

        let result = exchange_donor_validity(&group, &mesh, &statuses, requests.clone());
        assert_eq!(result[&(Rank(0), 0)], true);

        statuses[1] = NodeStatus::OutNode;
        let result = exchange_donor_validity(&group, &mesh, &statuses, requests);
        assert!(mesh.cell(0).nodes.iter().all(|&n| statuses[n as usize] != NodeStatus::InNode));
        assert_eq!(result[&(Rank(0), 0)], false);
    }
}
