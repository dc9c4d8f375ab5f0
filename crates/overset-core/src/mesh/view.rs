use crate::geometry::{Point, Scalar};

use super::boundary_face::BoundaryFace;
use super::cell::Cell;
use super::node::{ComponentId, GlobalId, Rank};

/// Uniform read-only access to a local mesh partition (spec.md §4.1).
///
/// Positional accessors are generic over `Scalar` so the same trait serves
/// both the real and the complex-differentiated build (spec.md §9): callers
/// that only need real coordinates use `position::<f64>`, a differentiated
/// host solver uses `position::<num_complex::Complex64>`.
///
/// No caching is mandated; implementors are free to recompute on every call
/// since a `MeshView` is only valid for the duration of one assembly pass.
pub trait MeshView {
    fn node_count(&self) -> usize;
    fn cell_count(&self) -> usize;
    fn face_count(&self) -> usize;

    fn position<T: Scalar>(&self, local_node: usize) -> Point<T>;
    fn global_id(&self, local_node: usize) -> GlobalId;
    fn owner(&self, local_node: usize) -> Rank;
    fn component(&self, local_node: usize) -> ComponentId;

    fn cell(&self, local_cell: usize) -> &Cell;
    fn boundary_face(&self, local_face: usize) -> &BoundaryFace;

    fn this_rank(&self) -> Rank;

    fn position_real(&self, local_node: usize) -> [f64; 3] {
        self.position::<f64>(local_node).re()
    }

    fn is_owned(&self, local_node: usize) -> bool {
        self.owner(local_node) == self.this_rank()
    }

    fn cells(&self) -> std::ops::Range<usize> {
        0..self.cell_count()
    }

    fn nodes(&self) -> std::ops::Range<usize> {
        0..self.node_count()
    }

    fn faces(&self) -> std::ops::Range<usize> {
        0..self.face_count()
    }

    /// Axis-aligned extent of a cell's vertices, in real coordinates.
    fn cell_extent(&self, local_cell: usize) -> crate::geometry::Extent {
        let cell = self.cell(local_cell);
        let pts = cell.nodes.iter().map(|&n| self.position_real(n as usize));
        crate::geometry::Extent::from_points(pts).expect("cell always has nodes")
    }

    fn cell_vertices(&self, local_cell: usize) -> smallvec::SmallVec<[Point<f64>; 8]> {
        self.cell(local_cell)
            .nodes
            .iter()
            .map(|&n| self.position::<f64>(n as usize))
            .collect()
    }
}
