//! Multi-pass node classification (spec.md §4.9).
//!
//! Grounded on `original_source/yoga/src/DruyorTypeAssignment.cpp` for the
//! sixteen-step ordering and `original_source/yoga/src/YogaStatuses.h` for
//! the status encoding, which is kept bit-compatible with spec.md §6's DCIF
//! iblank mapping. Every per-node write in [`machine`] is followed by a
//! ghost sync, the single choke point [`machine::sync_ghosts`].

mod donor_validity;
mod machine;
mod receptor;

pub use donor_validity::exchange_donor_validity;
pub use machine::{build_neighbor_graph, build_straddling_flags, run_status_machine, sync_ghosts, StatusInput, StatusMachineConfig};
pub use receptor::{Receptor, ReceptorBuilder};

use serde::{Deserialize, Serialize};

/// A node's classification (spec.md §3). `Unknown`, `MandatoryReceptor` and
/// `ReceptorCandidate` are transient — the sanity check (step 16) forbids
/// them at termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Unknown,
    MandatoryReceptor,
    ReceptorCandidate,
    InNode,
    OutNode,
    FringeNode,
    Orphan,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeStatus::InNode | NodeStatus::OutNode | NodeStatus::FringeNode | NodeStatus::Orphan
        )
    }

    /// DCIF iblank code (spec.md §6): only defined for terminal statuses.
    pub fn dcif_code(self) -> Option<i8> {
        match self {
            NodeStatus::OutNode => Some(0),
            NodeStatus::InNode => Some(1),
            NodeStatus::FringeNode => Some(-1),
            NodeStatus::Orphan => Some(-2),
            _ => None,
        }
    }

    /// Total order used only for the ghost-sync gather-max reduction
    /// (`machine::sync_ghosts`): later-pipeline statuses outrank earlier
    /// ones so a ghost copy always converges to whatever its owner has
    /// written most recently, never regresses to a stale transient state.
    pub(crate) fn sync_rank(self) -> i32 {
        match self {
            NodeStatus::Unknown => 0,
            NodeStatus::ReceptorCandidate => 1,
            NodeStatus::MandatoryReceptor => 2,
            NodeStatus::OutNode => 3,
            NodeStatus::InNode => 4,
            NodeStatus::FringeNode => 5,
            NodeStatus::Orphan => 6,
        }
    }

    pub(crate) fn from_sync_rank(r: i32) -> Self {
        match r {
            0 => NodeStatus::Unknown,
            1 => NodeStatus::ReceptorCandidate,
            2 => NodeStatus::MandatoryReceptor,
            3 => NodeStatus::OutNode,
            4 => NodeStatus::InNode,
            5 => NodeStatus::FringeNode,
            _ => NodeStatus::Orphan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dcif_code_only_defined_for_terminal_statuses() {
        assert_eq!(NodeStatus::OutNode.dcif_code(), Some(0));
        assert_eq!(NodeStatus::InNode.dcif_code(), Some(1));
        assert_eq!(NodeStatus::FringeNode.dcif_code(), Some(-1));
        assert_eq!(NodeStatus::Orphan.dcif_code(), Some(-2));
        assert_eq!(NodeStatus::Unknown.dcif_code(), None);
        assert_eq!(NodeStatus::MandatoryReceptor.dcif_code(), None);
        assert_eq!(NodeStatus::ReceptorCandidate.dcif_code(), None);
    }

    #[test]
    fn sync_rank_round_trips() {
        for s in [
            NodeStatus::Unknown,
            NodeStatus::ReceptorCandidate,
            NodeStatus::MandatoryReceptor,
            NodeStatus::OutNode,
            NodeStatus::InNode,
            NodeStatus::FringeNode,
            NodeStatus::Orphan,
        ] {
            assert_eq!(NodeStatus::from_sync_rank(s.sync_rank()), s);
        }
    }
}
