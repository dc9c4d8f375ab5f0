use crate::geometry::Extent;

/// Regular `Nx * Ny * Nz` Cartesian block over an extent (spec.md §4.2).
///
/// Used both by the hole map (spec.md §4.4) and by the "improve
/// multi-overlap regions" mandatory-receptor mask (spec.md §4.9 step 4).
#[derive(Debug, Clone)]
pub struct CartesianBlock {
    extent: Extent,
    dims: [usize; 3],
    cell_size: [f64; 3],
}

impl CartesianBlock {
    pub fn new(extent: Extent, dims: [usize; 3]) -> Self {
        let cell_size = std::array::from_fn(|i| {
            let span = extent.max[i] - extent.min[i];
            if dims[i] == 0 {
                0.0
            } else {
                span / dims[i] as f64
            }
        });
        CartesianBlock {
            extent,
            dims,
            cell_size,
        }
    }

    /// Picks `(Nx, Ny, Nz)` to match the extent's aspect ratio while keeping
    /// the total cell count at or below `max_cells` (spec.md §4.2 "The block
    /// generator picks (N_x, N_y, N_z) to match the extent aspect ratio
    /// while keeping total cells ≤ a supplied maximum").
    pub fn generate(extent: Extent, max_cells: usize) -> Self {
        let max_cells = max_cells.max(1);
        let half = extent.half_extent();
        // Degenerate (zero-thickness) axes still get one layer so the block
        // stays a valid 3D grid.
        let span: [f64; 3] = std::array::from_fn(|i| (2.0 * half[i]).max(1e-12));
        let volume_like = span[0] * span[1] * span[2];
        let target_edge = (volume_like / max_cells as f64).cbrt();

        let mut dims: [usize; 3] =
            std::array::from_fn(|i| ((span[i] / target_edge).round() as usize).max(1));

        // The rounding above can overshoot max_cells; shrink the largest
        // axis until we're back under budget.
        while dims[0] * dims[1] * dims[2] > max_cells {
            let (axis, _) = dims
                .iter()
                .enumerate()
                .max_by_key(|&(_, &d)| d)
                .unwrap();
            if dims[axis] <= 1 {
                break;
            }
            dims[axis] -= 1;
        }

        CartesianBlock::new(extent, dims)
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn cell_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    pub fn cell_id(&self, ijk: [usize; 3]) -> usize {
        ijk[0] + self.dims[0] * (ijk[1] + self.dims[1] * ijk[2])
    }

    pub fn ijk_of(&self, cell_id: usize) -> [usize; 3] {
        let i = cell_id % self.dims[0];
        let j = (cell_id / self.dims[0]) % self.dims[1];
        let k = cell_id / (self.dims[0] * self.dims[1]);
        [i, j, k]
    }

    fn index_along_axis(&self, axis: usize, coord: f64) -> Option<usize> {
        if coord < self.extent.min[axis] || coord > self.extent.max[axis] {
            return None;
        }
        if self.cell_size[axis] <= 0.0 {
            return Some(0);
        }
        let idx = ((coord - self.extent.min[axis]) / self.cell_size[axis]) as usize;
        Some(idx.min(self.dims[axis] - 1))
    }

    /// The id of the cell containing `p`, or `None` if `p` is outside the
    /// block's extent.
    pub fn containing_cell_id(&self, p: [f64; 3]) -> Option<usize> {
        let ijk = [
            self.index_along_axis(0, p[0])?,
            self.index_along_axis(1, p[1])?,
            self.index_along_axis(2, p[2])?,
        ];
        Some(self.cell_id(ijk))
    }

    /// All cell ids whose extent overlaps `query`.
    pub fn cells_overlapping(&self, query: &Extent) -> Vec<usize> {
        let axis_range = |axis: usize| -> (usize, usize) {
            let lo = self
                .index_along_axis(axis, query.min[axis])
                .unwrap_or(0);
            let hi = self
                .index_along_axis(axis, query.max[axis])
                .unwrap_or(self.dims[axis] - 1);
            (lo.min(hi), lo.max(hi))
        };
        let (i0, i1) = axis_range(0);
        let (j0, j1) = axis_range(1);
        let (k0, k1) = axis_range(2);

        let mut out = Vec::with_capacity((i1 - i0 + 1) * (j1 - j0 + 1) * (k1 - k0 + 1));
        for k in k0..=k1 {
            for j in j0..=j1 {
                for i in i0..=i1 {
                    out.push(self.cell_id([i, j, k]));
                }
            }
        }
        out
    }

    pub fn cell_extent(&self, cell_id: usize) -> Extent {
        let [i, j, k] = self.ijk_of(cell_id);
        let min = [
            self.extent.min[0] + i as f64 * self.cell_size[0],
            self.extent.min[1] + j as f64 * self.cell_size[1],
            self.extent.min[2] + k as f64 * self.cell_size[2],
        ];
        let max = [
            min[0] + self.cell_size[0],
            min[1] + self.cell_size[1],
            min[2] + self.cell_size[2],
        ];
        Extent::new(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_respects_max_cell_budget() {
        let extent = Extent::new([0.0, 0.0, 0.0], [10.0, 1.0, 1.0]);
        let block = CartesianBlock::generate(extent, 100);
        assert!(block.cell_count() <= 100);
        // Aspect ratio: the long axis should get noticeably more divisions.
        assert!(block.dims()[0] > block.dims()[1]);
    }

    #[test]
    fn cell_id_and_ijk_roundtrip() {
        let block = CartesianBlock::new(Extent::new([0.0; 3], [1.0; 3]), [3, 4, 5]);
        for k in 0..5 {
            for j in 0..4 {
                for i in 0..3 {
                    let id = block.cell_id([i, j, k]);
                    assert_eq!(block.ijk_of(id), [i, j, k]);
                }
            }
        }
    }

    #[test]
    fn containing_cell_id_finds_the_right_cell() {
        let block = CartesianBlock::new(Extent::new([0.0; 3], [2.0; 3]), [2, 2, 2]);
        let id = block.containing_cell_id([1.5, 1.5, 1.5]).unwrap();
        assert_eq!(block.ijk_of(id), [1, 1, 1]);
        assert!(block.containing_cell_id([3.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn cells_overlapping_covers_a_sub_extent() {
        let block = CartesianBlock::new(Extent::new([0.0; 3], [4.0; 3]), [4, 4, 4]);
        let hits = block.cells_overlapping(&Extent::new([0.5, 0.5, 0.5], [1.5, 1.5, 1.5]));
        assert!(hits.contains(&block.cell_id([0, 0, 0])));
        assert!(hits.contains(&block.cell_id([1, 1, 1])));
    }
}
