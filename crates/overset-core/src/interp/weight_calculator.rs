use crate::mesh::CellType;

use super::{lagrange, least_squares};

/// A weighting scheme for turning a donor stencil into interpolation
/// weights.
///
/// spec.md §9 is explicit that weight calculators are supplied to the
/// donor finder as a first-class value, not dispatched through a trait
/// object on a base "WeightCalculator" class: the schemes are a closed
/// set known at compile time, so an enum matched with a function is both
/// simpler and faster than virtual dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WeightCalculator {
    /// Exact element-local Lagrange basis, falling back to inverse
    /// distance when the inverse map doesn't converge inside the element.
    Lagrange,
    /// Least-squares linear reconstruction over an arbitrary point cloud
    /// (used for distance-field donors and other unstructured stencils).
    LeastSquares,
    /// Pure inverse-distance weighting, ignoring element topology.
    InverseDistance,
}

impl WeightCalculator {
    /// Computes weights for `query` against a donor stencil.
    ///
    /// `cell_type` is only consulted by [`WeightCalculator::Lagrange`]; the
    /// other two variants treat `points` as an unstructured cloud.
    pub fn weights(
        self,
        cell_type: Option<CellType>,
        points: &[[f64; 3]],
        query: [f64; 3],
    ) -> Vec<f64> {
        match self {
            WeightCalculator::Lagrange => {
                let cell_type = cell_type
                    .unwrap_or_else(|| CellType::from_node_count(points.len()).unwrap_or(CellType::Tet));
                lagrange::lagrange_weights(cell_type, points, query)
            }
            WeightCalculator::LeastSquares => least_squares::least_squares_weights(points, query),
            WeightCalculator::InverseDistance => lagrange::inverse_distance_weights(points, query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tet() -> [[f64; 3]; 4] {
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
    }

    #[test]
    fn lagrange_variant_dispatches_to_element_basis() {
        let weights = WeightCalculator::Lagrange.weights(Some(CellType::Tet), &unit_tet(), [0.0, 0.0, 1.0]);
        assert!((weights[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_distance_variant_sums_to_one() {
        let weights = WeightCalculator::InverseDistance.weights(None, &unit_tet(), [10.0, 10.0, 10.0]);
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }
}
