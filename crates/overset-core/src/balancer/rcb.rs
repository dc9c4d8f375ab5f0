/// Weighted recursive coordinate bisection over a point cloud, splitting
/// indices into `num_parts` contiguous-in-space groups whose summed weight
/// stays within `tolerance` of the proportional target at every split
/// (spec.md §4.6 steps 2-3).
///
/// Grounded on `examples/other_examples/manifests/SMoraisDev-coupe`'s
/// `rcb` family: split along the longest axis, find the weighted median,
/// recurse on each half with a proportional share of the remaining parts.
/// `num_parts` need not be a power of two — the `left`/`right` split sizes
/// are `num_parts / 2` and the remainder, so any count converges.
pub fn recursive_bisect(points: &[[f64; 3]], weights: &[f64], num_parts: usize, tolerance: f64) -> Vec<usize> {
    let mut out = vec![0usize; points.len()];
    if points.is_empty() || num_parts <= 1 {
        return out;
    }
    let indices: Vec<usize> = (0..points.len()).collect();
    assign(&indices, points, weights, num_parts, 0, tolerance, &mut out);
    out
}

fn longest_axis(indices: &[usize], points: &[[f64; 3]]) -> usize {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for &i in indices {
        for a in 0..3 {
            min[a] = min[a].min(points[i][a]);
            max[a] = max[a].max(points[i][a]);
        }
    }
    (0..3)
        .max_by(|&a, &b| (max[a] - min[a]).partial_cmp(&(max[b] - min[b])).unwrap())
        .unwrap()
}

fn assign(
    indices: &[usize],
    points: &[[f64; 3]],
    weights: &[f64],
    num_parts: usize,
    part_offset: usize,
    tolerance: f64,
    out: &mut [usize],
) {
    if num_parts <= 1 || indices.len() <= 1 {
        for &i in indices {
            out[i] = part_offset;
        }
        return;
    }

    let left_parts = num_parts / 2;
    let right_parts = num_parts - left_parts;
    let total_weight: f64 = indices.iter().map(|&i| weights[i]).sum();
    let target_left_weight = total_weight * (left_parts as f64 / num_parts as f64);

    let axis = longest_axis(indices, points);
    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_by(|&a, &b| points[a][axis].partial_cmp(&points[b][axis]).unwrap());

    let mut acc = 0.0;
    let mut split_pos = sorted.len();
    for (pos, &i) in sorted.iter().enumerate() {
        acc += weights[i];
        if acc >= target_left_weight - tolerance * total_weight.max(1.0) {
            split_pos = pos + 1;
            break;
        }
    }
    // Keep both halves non-empty whenever there's more than one point to
    // split, so a pathological weight distribution never starves a part.
    let split_pos = split_pos.clamp(1, sorted.len() - 1);

    let (left, right) = sorted.split_at(split_pos);
    assign(left, points, weights, left_parts, part_offset, tolerance, out);
    assign(right, points, weights, right_parts, part_offset + left_parts, tolerance, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_is_assigned_a_part_in_range() {
        let points: Vec<[f64; 3]> = (0..100).map(|i| [i as f64, 0.0, 0.0]).collect();
        let weights = vec![1.0; 100];
        let parts = recursive_bisect(&points, &weights, 7, 1e-4);
        assert_eq!(parts.len(), 100);
        assert!(parts.iter().all(|&p| p < 7));
        for p in 0..7 {
            assert!(parts.iter().any(|&q| q == p), "part {p} starved");
        }
    }

    #[test]
    fn uniform_weights_split_evenly_in_two() {
        let points: Vec<[f64; 3]> = (0..200).map(|i| [i as f64, 0.0, 0.0]).collect();
        let weights = vec![1.0; 200];
        let parts = recursive_bisect(&points, &weights, 2, 1e-4);
        let left_count = parts.iter().filter(|&&p| p == 0).count();
        assert!((left_count as i64 - 100).abs() <= 2);
    }

    #[test]
    fn single_part_keeps_everything_together() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let weights = vec![1.0, 3.0];
        let parts = recursive_bisect(&points, &weights, 1, 1e-4);
        assert_eq!(parts, vec![0, 0]);
    }
}
