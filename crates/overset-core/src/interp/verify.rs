use crate::error::OversetError;

/// Verifies that a donor weight set reproduces the query point (spec.md
/// §4.3): `||sum_i w_i p_i - q|| <= max(1e-6 * scale, ...)` where
/// `scale = max(||donor-extent||, ||farthest donor from origin||)`.
///
/// Returns `Err(OversetError::WeightNonConvergence)` carrying the donor
/// stencil and query point when the check fails, per spec.md §7 (fatal,
/// dumps the stencil).
pub fn verify_weights(
    donors: &[[f64; 3]],
    weights: &[f64],
    query: [f64; 3],
) -> Result<(), OversetError> {
    assert_eq!(donors.len(), weights.len());

    let reconstructed = donors.iter().zip(weights.iter()).fold([0.0; 3], |acc, (p, w)| {
        std::array::from_fn(|i| acc[i] + w * p[i])
    });
    let residual = (0..3).map(|i| (reconstructed[i] - query[i]).powi(2)).sum::<f64>().sqrt();

    let scale = scale_of(donors);
    let tolerance = (1.0e-6 * scale).max(1.0e-12);

    if residual > tolerance {
        return Err(OversetError::WeightNonConvergence {
            message: format!(
                "donor weights reproduce query point with residual {residual:.3e}, exceeding tolerance {tolerance:.3e}"
            ),
            query,
            donor_stencil: donors.to_vec(),
        });
    }
    Ok(())
}

/// `scale = max(donor-extent diagonal, farthest donor distance from origin)`.
fn scale_of(donors: &[[f64; 3]]) -> f64 {
    let extent = crate::geometry::Extent::from_points(donors.iter().copied())
        .unwrap_or(crate::geometry::Extent::new([0.0; 3], [0.0; 3]));
    let donor_extent_norm = extent.diagonal();
    let farthest_from_origin = donors
        .iter()
        .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
        .fold(0.0_f64, f64::max);
    donor_extent_norm.max(farthest_from_origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_reproduction_passes() {
        let donors = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let weights = [0.25, 0.25, 0.25, 0.25];
        let query = [0.25, 0.25, 0.25];
        assert!(verify_weights(&donors, &weights, query).is_ok());
    }

    #[test]
    fn bad_weights_are_rejected() {
        let donors = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let weights = [1.0, 0.0, 0.0, 0.0];
        let query = [0.9, 0.9, 0.9];
        let err = verify_weights(&donors, &weights, query).unwrap_err();
        match err {
            OversetError::WeightNonConvergence { donor_stencil, .. } => {
                assert_eq!(donor_stencil.len(), 4);
            }
            _ => panic!("expected WeightNonConvergence"),
        }
    }
}
