//! DCIF binary writer (spec.md §6): the donor-connectivity interchange
//! file format a host solver reads back after an assembly pass, all
//! multi-byte values little-endian.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::mesh::{ComponentId, GlobalId};
use crate::status::NodeStatus;

/// One component's half-open node-id range in the DCIF's global-id
/// ordering, plus its fun3d-imesh id (spec.md §6: "last component gets id
/// 0, others get component_id + 1").
#[derive(Debug, Clone, Copy)]
pub struct ComponentRange {
    pub component: ComponentId,
    pub start: i64,
    pub end: i64,
}

/// Everything a DCIF write needs, already collated by the driver: every
/// node's terminal status keyed by global id (iterated in ascending
/// global-id order, per spec.md §6 "ordered by global id"), every fringe's
/// donor global ids and weights, and the component range table.
pub struct DcifInput<'a> {
    pub statuses_by_global_id: &'a BTreeMap<GlobalId, NodeStatus>,
    pub fringe_donors: &'a BTreeMap<GlobalId, Vec<(GlobalId, f64)>>,
    pub component_ranges: &'a [ComponentRange],
}

/// Writes the DCIF layout of spec.md §6 to `out`.
pub fn write_dcif<W: Write>(out: &mut W, input: &DcifInput<'_>) -> io::Result<()> {
    let nnodes = input.statuses_by_global_id.len() as i64;
    let nfringes = input.fringe_donors.len() as i64;
    let ndonors: i64 = input.fringe_donors.values().map(|d| d.len() as i64).sum();
    let ncomponents = input.component_ranges.len() as i32;

    out.write_all(&nnodes.to_le_bytes())?;
    out.write_all(&nfringes.to_le_bytes())?;
    out.write_all(&ndonors.to_le_bytes())?;
    out.write_all(&ncomponents.to_le_bytes())?;

    // Fringe global ids, 1-based.
    for &gid in input.fringe_donors.keys() {
        out.write_all(&(one_based(gid)).to_le_bytes())?;
    }

    // Donor count per fringe.
    for donors in input.fringe_donors.values() {
        let count = i8::try_from(donors.len()).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "donor count exceeds i8::MAX"))?;
        out.write_all(&count.to_le_bytes())?;
    }

    // Donor global ids, 1-based, flattened in fringe order.
    for donors in input.fringe_donors.values() {
        for &(donor_gid, _) in donors {
            out.write_all(&one_based(donor_gid).to_le_bytes())?;
        }
    }

    // Donor weights, same flattened order.
    for donors in input.fringe_donors.values() {
        for &(_, weight) in donors {
            out.write_all(&weight.to_le_bytes())?;
        }
    }

    // Per-node iblank status, ordered by global id.
    for &status in input.statuses_by_global_id.values() {
        let code = status
            .dcif_code()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("non-terminal status {status:?} cannot be written to DCIF")))?;
        out.write_all(&code.to_le_bytes())?;
    }

    // Component range table.
    let last_index = input.component_ranges.len().saturating_sub(1);
    for (i, range) in input.component_ranges.iter().enumerate() {
        out.write_all(&range.start.to_le_bytes())?;
        out.write_all(&range.end.to_le_bytes())?;
        let fun3d_id: i32 = if i == last_index { 0 } else { range.component.0 as i32 + 1 };
        out.write_all(&fun3d_id.to_le_bytes())?;
    }

    Ok(())
}

fn one_based(gid: GlobalId) -> i64 {
    gid.0 as i64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_body_lengths_match_record_counts() {
        let mut statuses = BTreeMap::new();
        statuses.insert(GlobalId(0), NodeStatus::InNode);
        statuses.insert(GlobalId(1), NodeStatus::OutNode);
        statuses.insert(GlobalId(2), NodeStatus::FringeNode);

        let mut fringe_donors = BTreeMap::new();
        fringe_donors.insert(GlobalId(2), vec![(GlobalId(0), 0.5), (GlobalId(1), 0.5)]);

        let ranges = [ComponentRange {
            component: ComponentId(0),
            start: 0,
            end: 3,
        }];

        let input = DcifInput {
            statuses_by_global_id: &statuses,
            fringe_donors: &fringe_donors,
            component_ranges: &ranges,
        };

        let mut buf = Vec::new();
        write_dcif(&mut buf, &input).unwrap();

        assert_eq!(&buf[0..8], &3i64.to_le_bytes()); // nnodes
        assert_eq!(&buf[8..16], &1i64.to_le_bytes()); // nfringes
        assert_eq!(&buf[16..24], &2i64.to_le_bytes()); // ndonors
        assert_eq!(&buf[24..28], &1i32.to_le_bytes()); // ncomponents
    }

    #[test]
    fn non_terminal_status_is_rejected() {
        let mut statuses = BTreeMap::new();
        statuses.insert(GlobalId(0), NodeStatus::Unknown);
        let fringe_donors = BTreeMap::new();
        let ranges = [];
        let input = DcifInput {
            statuses_by_global_id: &statuses,
            fringe_donors: &fringe_donors,
            component_ranges: &ranges,
        };
        let mut buf = Vec::new();
        assert!(write_dcif(&mut buf, &input).is_err());
    }
}
