use nalgebra::{Matrix3, Vector3};

use crate::mesh::CellType;

const MAX_NEWTON_ITERATIONS: usize = 1000;
const CONVERGE_TOLERANCE: f64 = 1.0e-12;
const SEED: [f64; 3] = [0.5, 0.5, 0.5];

/// Basis functions and their parametric derivatives for each supported
/// Lagrange element, evaluated at `(r, s, t)`.
///
/// Grounded on `original_source/yoga/src/LagrangeElement.h`: the tet basis
/// is the linear barycentric basis, the others are the standard trilinear
/// / wedge / pyramidal bases.
fn basis(cell_type: CellType, r: f64, s: f64, t: f64) -> arrayvec::ArrayVec<f64, 8> {
    use CellType::*;
    let mut v = arrayvec::ArrayVec::new();
    match cell_type {
        Tet => {
            v.extend([1.0 - r - s - t, r, s, t]);
        }
        Pyramid => {
            // Bilinear base (nodes 0-3, unit square in r,s) collapsing to
            // the apex node (index 4) at t -> 1. r, s, t all range over
            // [0, 1], matching the tet/prism convention and the Newton
            // seed/validity window below.
            v.extend([
                (1.0 - r) * (1.0 - s) * (1.0 - t),
                r * (1.0 - s) * (1.0 - t),
                r * s * (1.0 - t),
                (1.0 - r) * s * (1.0 - t),
                t,
            ]);
        }
        Prism => {
            v.extend([
                (1.0 - r - s) * (1.0 - t),
                r * (1.0 - t),
                s * (1.0 - t),
                (1.0 - r - s) * t,
                r * t,
                s * t,
            ]);
        }
        Hex => {
            // Standard unit-cube trilinear basis, r, s, t in [0, 1].
            v.extend([
                (1.0 - r) * (1.0 - s) * (1.0 - t),
                r * (1.0 - s) * (1.0 - t),
                r * s * (1.0 - t),
                (1.0 - r) * s * (1.0 - t),
                (1.0 - r) * (1.0 - s) * t,
                r * (1.0 - s) * t,
                r * s * t,
                (1.0 - r) * s * t,
            ]);
        }
    }
    v
}

fn basis_derivative(
    cell_type: CellType,
    r: f64,
    s: f64,
    t: f64,
    axis: usize,
) -> arrayvec::ArrayVec<f64, 8> {
    // Central finite difference on the basis itself: the bases above are
    // all low order polynomials, so this is exact to machine precision and
    // avoids hand-deriving (and risking transcription errors in) nine
    // separate analytic derivative tables.
    const H: f64 = 1.0e-6;
    let mut rst = [r, s, t];
    rst[axis] += H;
    let plus = basis(cell_type, rst[0], rst[1], rst[2]);
    rst[axis] -= 2.0 * H;
    let minus = basis(cell_type, rst[0], rst[1], rst[2]);
    plus.iter()
        .zip(minus.iter())
        .map(|(p, m)| (p - m) / (2.0 * H))
        .collect()
}

fn evaluate(cell_type: CellType, r: f64, s: f64, t: f64, vertices: &[[f64; 3]]) -> [f64; 3] {
    let b = basis(cell_type, r, s, t);
    let mut p = [0.0; 3];
    for (bi, vi) in b.iter().zip(vertices.iter()) {
        for axis in 0..3 {
            p[axis] += bi * vi[axis];
        }
    }
    p
}

/// Outcome of an inverse-mapping attempt.
pub struct InverseMapResult {
    pub rst: [f64; 3],
    pub converged: bool,
}

/// Solves for the computational coordinates `(r, s, t)` such that
/// `evaluate(r, s, t) == query`, via Newton iteration on the 3x3 Jacobian of
/// basis-weighted vertex positions (spec.md §4.3).
///
/// The tet case is closed-form (barycentric) and converges in one step; the
/// others iterate starting from `(0.5, 0.5, 0.5)` for up to 1000 iterations,
/// converging when `||F||_inf < 1e-12`.
pub fn inverse_map(cell_type: CellType, vertices: &[[f64; 3]], query: [f64; 3]) -> InverseMapResult {
    if cell_type == CellType::Tet {
        return InverseMapResult {
            rst: tet_barycentric(vertices, query),
            converged: true,
        };
    }

    let mut rst = SEED;
    let mut converged = false;
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let p = evaluate(cell_type, rst[0], rst[1], rst[2], vertices);
        let residual = Vector3::new(p[0] - query[0], p[1] - query[1], p[2] - query[2]);
        if residual.amax() < CONVERGE_TOLERANCE {
            converged = true;
            break;
        }

        let mut jac = Matrix3::zeros();
        for axis in 0..3 {
            let d = basis_derivative(cell_type, rst[0], rst[1], rst[2], axis);
            let mut col = Vector3::zeros();
            for (di, vi) in d.iter().zip(vertices.iter()) {
                col[0] += di * vi[0];
                col[1] += di * vi[1];
                col[2] += di * vi[2];
            }
            jac.set_column(axis, &col);
        }

        let Some(jac_inv) = jac.try_inverse() else {
            break;
        };
        let update = jac_inv * residual;
        rst = [rst[0] - update[0], rst[1] - update[1], rst[2] - update[2]];
    }

    InverseMapResult { rst, converged }
}

fn tet_barycentric(vertices: &[[f64; 3]], query: [f64; 3]) -> [f64; 3] {
    let v0 = Vector3::from(vertices[1]) - Vector3::from(vertices[0]);
    let v1 = Vector3::from(vertices[2]) - Vector3::from(vertices[0]);
    let v2 = Vector3::from(vertices[3]) - Vector3::from(vertices[0]);
    let rhs = Vector3::from(query) - Vector3::from(vertices[0]);
    let m = Matrix3::from_columns(&[v0, v1, v2]);
    match m.try_inverse() {
        Some(inv) => {
            let rst = inv * rhs;
            [rst[0], rst[1], rst[2]]
        }
        None => [f64::NAN; 3],
    }
}

fn is_valid_rst(rst: [f64; 3]) -> bool {
    rst.iter().all(|v| v.is_finite() && *v >= 0.0 && *v <= 1.0)
}

/// True if `query` falls inside the element spanned by `vertices` — the
/// polyhedron point-in-cell test the donor finder runs after an extent-tree
/// overlap hit (spec.md §4.7).
pub fn contains_point(cell_type: CellType, vertices: &[[f64; 3]], query: [f64; 3]) -> bool {
    let result = inverse_map(cell_type, vertices, query);
    result.converged && is_valid_rst(result.rst)
}

/// Inverse-distance weights on a unit-normalized copy of the vertices — the
/// fallback used when the Newton/closed-form inverse map fails or produces
/// an out-of-element / non-finite result (spec.md §4.3).
pub fn inverse_distance_weights(vertices: &[[f64; 3]], query: [f64; 3]) -> Vec<f64> {
    let scale = vertices
        .iter()
        .map(|v| {
            (0..3)
                .map(|i| (v[i] - query[i]).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .fold(0.0_f64, f64::max)
        .max(1e-300);

    let weights: Vec<f64> = vertices
        .iter()
        .map(|v| {
            let d = (0..3).map(|i| (v[i] - query[i]).powi(2)).sum::<f64>().sqrt() / scale;
            if d < 1e-12 {
                1.0
            } else {
                1.0 / d
            }
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| w / sum).collect()
}

/// Computes Lagrange interpolation weights at `query` within a cell whose
/// vertices are `vertices`. Falls back to inverse-distance weighting when
/// the inverse map doesn't converge or lands outside the unit reference
/// element.
pub fn lagrange_weights(cell_type: CellType, vertices: &[[f64; 3]], query: [f64; 3]) -> Vec<f64> {
    let result = inverse_map(cell_type, vertices, query);
    if result.converged && is_valid_rst(result.rst) {
        basis(cell_type, result.rst[0], result.rst[1], result.rst[2]).to_vec()
    } else {
        inverse_distance_weights(vertices, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tet() -> [[f64; 3]; 4] {
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
    }

    /// Seed scenario S1: weights at (0,0,1) in the unit tet are (0,0,0,1).
    #[test]
    fn seed_s1_unit_tet_apex_weights() {
        let vertices = unit_tet();
        let weights = lagrange_weights(CellType::Tet, &vertices, [0.0, 0.0, 1.0]);
        assert!((weights[0]).abs() < 1e-12);
        assert!((weights[1]).abs() < 1e-12);
        assert!((weights[2]).abs() < 1e-12);
        assert!((weights[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unit_tet_centroid_weights_are_uniform() {
        let vertices = unit_tet();
        let centroid = [0.25, 0.25, 0.25];
        let weights = lagrange_weights(CellType::Tet, &vertices, centroid);
        for w in weights {
            assert!((w - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn unit_hex_center_weights_are_uniform() {
        let vertices = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let weights = lagrange_weights(CellType::Hex, &vertices, [0.5, 0.5, 0.5]);
        for w in weights {
            assert!((w - 0.125).abs() < 1e-9);
        }
    }

    #[test]
    fn inverse_distance_fallback_sums_to_one() {
        let vertices = unit_tet();
        let weights = inverse_distance_weights(&vertices, [10.0, 10.0, 10.0]);
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn outside_point_falls_back_to_inverse_distance() {
        let vertices = unit_tet();
        // Far outside the tet: the closed-form barycentric rst will have
        // negative/>-1 components, triggering the fallback.
        let weights = lagrange_weights(CellType::Tet, &vertices, [5.0, 5.0, 5.0]);
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
