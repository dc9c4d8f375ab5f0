//! Integration tests for the full assembly pipeline, exercised only through
//! the crate's public API (seed scenarios of spec.md §8).

use overset_core::comm::SingleRankGroup;
use overset_core::geometry::{Point, Scalar};
use overset_core::mesh::{BcTag, BoundaryFace, Cell, CellType, ComponentId, GlobalId, MeshView, Rank};
use overset_core::prelude::*;

/// Component 0: a tet enclosing `{x, y, z >= 0, x + y + z <= 4}`.
/// Component 1: a small tet strictly inside it, one face tagged
/// Interpolation. Mirrors seed scenario S5's "every interior B node covered
/// by an A cell ends Receptor on B, InNode on A, never both InNode" shape,
/// with a tet donor instead of a cube so the closed-form barycentric map
/// resolves weights exactly.
struct OverlaidMesh {
    positions: Vec<[f64; 3]>,
    cells: Vec<Cell>,
    faces: Vec<BoundaryFace>,
}

impl OverlaidMesh {
    fn new() -> Self {
        OverlaidMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [4.0, 0.0, 0.0],
                [0.0, 4.0, 0.0],
                [0.0, 0.0, 4.0],
                [1.0, 1.0, 1.0],
                [1.5, 1.0, 1.0],
                [1.0, 1.5, 1.0],
                [1.0, 1.0, 1.5],
            ],
            cells: vec![
                Cell::new(CellType::Tet, smallvec::smallvec![0u32, 1, 2, 3]),
                Cell::new(CellType::Tet, smallvec::smallvec![4u32, 5, 6, 7]),
            ],
            faces: vec![BoundaryFace::new(smallvec::smallvec![4u32, 5, 6], BcTag::Interpolation)],
        }
    }
}

impl MeshView for OverlaidMesh {
    fn node_count(&self) -> usize {
        self.positions.len()
    }
    fn cell_count(&self) -> usize {
        self.cells.len()
    }
    fn face_count(&self) -> usize {
        self.faces.len()
    }
    fn position<T: Scalar>(&self, local_node: usize) -> Point<T> {
        Point::from_real(self.positions[local_node])
    }
    fn global_id(&self, local_node: usize) -> GlobalId {
        GlobalId(local_node as u64)
    }
    fn owner(&self, _local_node: usize) -> Rank {
        Rank(0)
    }
    fn component(&self, local_node: usize) -> ComponentId {
        ComponentId(if local_node < 4 { 0 } else { 1 })
    }
    fn cell(&self, local_cell: usize) -> &Cell {
        &self.cells[local_cell]
    }
    fn boundary_face(&self, local_face: usize) -> &BoundaryFace {
        &self.faces[local_face]
    }
    fn this_rank(&self) -> Rank {
        Rank(0)
    }
}

/// Seed scenario S5 (spec.md §8) plus testable properties 2 and 3: the
/// enclosed component's nodes end as receptors whose weights reconstruct
/// an affine field exactly, the enclosing component's nodes end `InNode`,
/// and the receptor map's key set is exactly the `FringeNode` set.
#[test]
fn overlapping_components_settle_into_donor_and_receptor() {
    let group = SingleRankGroup::new();
    let mesh = OverlaidMesh::new();
    let config = AssemblerConfig::default();
    let result = AssemblerDriver::run(&group, &mesh, &config).unwrap();

    for node in 0..4 {
        assert_eq!(result.statuses[node], NodeStatus::InNode);
    }
    for node in 4..8 {
        assert_eq!(result.statuses[node], NodeStatus::FringeNode);
    }

    // Property 3: status coverage — FringeNode nodes are exactly the
    // receptor map's keys.
    let fringe_ids: std::collections::BTreeSet<u64> = (0..mesh.node_count())
        .filter(|&n| result.statuses[n] == NodeStatus::FringeNode)
        .map(|n| n as u64)
        .collect();
    let receptor_ids: std::collections::BTreeSet<u64> = result.receptors.keys().map(|g| g.0).collect();
    assert_eq!(fringe_ids, receptor_ids);

    // Property 2: weight exactness on an affine field f(x) = a·x + b.
    let a = [2.3, 9.2, 3.9];
    let b = 1.2;
    let f = |p: [f64; 3]| a[0] * p[0] + a[1] * p[1] + a[2] * p[2] + b;
    for node in 4..8 {
        let point = &result.receptors[&GlobalId(node as u64)];
        let reconstructed: f64 = point.weights.iter().zip(point.donor_coordinates.iter()).map(|(w, p)| w * f(*p)).sum();
        assert!((reconstructed - f(mesh.positions[node])).abs() < 1e-9);
    }
}

/// A lone component with no Interpolation boundary and no overlap: every
/// node must close out `InNode`, and the receptor map stays empty.
#[test]
fn single_component_mesh_produces_no_receptors() {
    let group = SingleRankGroup::new();
    let mesh = OverlaidMesh::new();
    // Collapse to component 0 only by re-tagging every node the same way
    // a single-grid case would see it: drop the second cell and face by
    // building a fresh minimal mesh instead of mutating OverlaidMesh.
    struct SingleTet {
        positions: Vec<[f64; 3]>,
        cells: Vec<Cell>,
        faces: Vec<BoundaryFace>,
    }
    impl MeshView for SingleTet {
        fn node_count(&self) -> usize {
            self.positions.len()
        }
        fn cell_count(&self) -> usize {
            self.cells.len()
        }
        fn face_count(&self) -> usize {
            self.faces.len()
        }
        fn position<T: Scalar>(&self, local_node: usize) -> Point<T> {
            Point::from_real(self.positions[local_node])
        }
        fn global_id(&self, local_node: usize) -> GlobalId {
            GlobalId(local_node as u64)
        }
        fn owner(&self, _local_node: usize) -> Rank {
            Rank(0)
        }
        fn component(&self, _local_node: usize) -> ComponentId {
            ComponentId(0)
        }
        fn cell(&self, local_cell: usize) -> &Cell {
            &self.cells[local_cell]
        }
        fn boundary_face(&self, local_face: usize) -> &BoundaryFace {
            &self.faces[local_face]
        }
        fn this_rank(&self) -> Rank {
            Rank(0)
        }
    }
    let single = SingleTet {
        positions: mesh.positions[0..4].to_vec(),
        cells: vec![Cell::new(CellType::Tet, smallvec::smallvec![0u32, 1, 2, 3])],
        faces: Vec::new(),
    };
    let config = AssemblerConfig::default();
    let result = AssemblerDriver::run(&group, &single, &config).unwrap();
    assert!(result.statuses.iter().all(|&s| s == NodeStatus::InNode));
    assert!(result.receptors.is_empty());
}
