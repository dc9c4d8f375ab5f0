use super::CellState;
use crate::spatial::CartesianBlock;

/// A symmetry plane of one component, used to exclude spurious exterior
/// seeds that actually sit on a mesh symmetry boundary rather than in free
/// space (spec.md §4.4 step 5).
#[derive(Debug, Clone, Copy)]
pub struct SymmetryPlane {
    pub axis: usize,
    pub coordinate: f64,
}

/// Cells on the block's outer faces that are still `Untouched` — the
/// initial exterior-seed set before symmetry-plane filtering (spec.md §4.4
/// step 4).
pub fn boundary_exterior_seeds(block: &CartesianBlock, states: &[CellState]) -> Vec<usize> {
    let [nx, ny, nz] = block.dims();
    let mut seeds = Vec::new();
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let on_boundary = i == 0 || i == nx - 1 || j == 0 || j == ny - 1 || k == 0 || k == nz - 1;
                if !on_boundary {
                    continue;
                }
                let id = block.cell_id([i, j, k]);
                if states[id] == CellState::Untouched {
                    seeds.push(id);
                }
            }
        }
    }
    seeds
}

/// Drops seeds whose cell center lies on one of `planes` — those boundary
/// cells represent a symmetry cut of the same component, not open space,
/// and must not seed the "this is outside the body" flood fill (spec.md
/// §4.4 step 5).
pub fn remove_seeds_on_symmetry_planes(
    block: &CartesianBlock,
    seeds: Vec<usize>,
    planes: &[SymmetryPlane],
) -> Vec<usize> {
    if planes.is_empty() {
        return seeds;
    }
    seeds
        .into_iter()
        .filter(|&id| {
            let extent = block.cell_extent(id);
            let center = extent.center();
            let half = extent.half_extent();
            !planes.iter().any(|p| (center[p.axis] - p.coordinate).abs() <= half[p.axis] + 1e-9)
        })
        .collect()
}

/// Iterative (non-recursive) 6-connected stack flood fill from `seeds`:
/// everything reachable through `Untouched` cells becomes `OutOfHole`;
/// whatever remains `Untouched` afterward becomes `InHole` (spec.md §4.4
/// step 6).
pub fn stack_fill(block: &CartesianBlock, states: &mut [CellState], seeds: Vec<usize>) {
    let [nx, ny, nz] = block.dims();
    let mut stack = seeds;

    while let Some(id) = stack.pop() {
        if states[id] != CellState::Untouched {
            continue;
        }
        states[id] = CellState::OutOfHole;

        let [i, j, k] = block.ijk_of(id);
        let mut push_if_open = |ni: isize, nj: isize, nk: isize| {
            if ni < 0 || nj < 0 || nk < 0 {
                return;
            }
            let (ni, nj, nk) = (ni as usize, nj as usize, nk as usize);
            if ni >= nx || nj >= ny || nk >= nz {
                return;
            }
            let nid = block.cell_id([ni, nj, nk]);
            if states[nid] == CellState::Untouched {
                stack.push(nid);
            }
        };

        let (i, j, k) = (i as isize, j as isize, k as isize);
        push_if_open(i - 1, j, k);
        push_if_open(i + 1, j, k);
        push_if_open(i, j - 1, k);
        push_if_open(i, j + 1, k);
        push_if_open(i, j, k - 1);
        push_if_open(i, j, k + 1);
    }

    for state in states.iter_mut() {
        if *state == CellState::Untouched {
            *state = CellState::InHole;
        }
    }
}
