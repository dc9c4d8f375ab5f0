use std::collections::BTreeMap;

use crate::comm::ProcessGroup;
use crate::mesh::{ComponentId, Rank};
use crate::spatial::PointKdTree;

/// `sqrt(FLT_MAX)`, the sentinel every fragment-node distance starts at
/// (spec.md §4.8 step 1), kept as a 32-bit-float-derived constant to match
/// `original_source/yoga/src/NanoFlannDistanceCalculator.h`'s initialization.
fn initial_distance() -> f64 {
    (f32::MAX as f64).sqrt()
}

/// One component's chunked nearest-surface-distance pass (spec.md §4.8 step
/// 2): gathers `local_surface_points` from every rank to `root`, then
/// broadcasts it back out in chunks of at most `max_chunk` points so no
/// rank ever holds more than one chunk's worth of the combined surface at a
/// time. Each rank builds a local KD-tree per chunk and folds in the
/// running minimum distance for every position in `query_positions`.
///
/// Grounded on `original_source/yoga/src/ChunkedPointGatherer.h` /
/// `NanoFlannDistanceCalculator.h`'s "gather chunk, build local tree, take
/// running min" shape.
pub fn compute_component_distance<P: ProcessGroup>(
    process_group: &P,
    local_surface_points: &[[f64; 3]],
    query_positions: &[[f64; 3]],
    max_chunk: usize,
) -> Vec<f64> {
    let root = Rank(0);
    let mut distances = vec![initial_distance(); query_positions.len()];

    let total = process_group.parallel_sum_usize(local_surface_points.len());
    if total == 0 {
        return distances;
    }
    let max_chunk = max_chunk.max(1);
    let num_chunks = total.div_ceil(max_chunk);

    let gathered = process_group.gather(local_surface_points, root);
    let all_points: Vec<[f64; 3]> = if process_group.rank() == root {
        gathered.into_iter().flatten().collect()
    } else {
        Vec::new()
    };

    for round in 0..num_chunks {
        let mut encoded = if process_group.rank() == root {
            let start = (round * max_chunk).min(all_points.len());
            let end = (start + max_chunk).min(all_points.len());
            serde_json::to_string(&all_points[start..end]).expect("surface chunk always serializes")
        } else {
            String::new()
        };
        process_group.broadcast(&mut encoded, root);
        let chunk: Vec<[f64; 3]> = serde_json::from_str(&encoded).expect("broadcast surface chunk must round-trip");
        if chunk.is_empty() {
            continue;
        }

        let tree = PointKdTree::build(&chunk);
        for (d, &pos) in distances.iter_mut().zip(query_positions.iter()) {
            if let Some((_, d2)) = tree.nearest_squared(pos) {
                *d = d.min(d2.sqrt());
            }
        }
    }

    distances
}

/// Runs the full §4.8 distance calculation over every component, then
/// applies the optional per-component grid-importance rescale of step 3.
/// Each node's distance is only ever updated by its *own* component's
/// solid surface: the wall distance here is a per-node property used later
/// by the status machine's distance criterion (spec.md §4.9 step 7), not a
/// cross-component donor query.
pub fn compute_wall_distances<P: ProcessGroup>(
    process_group: &P,
    component_surface_points: &BTreeMap<ComponentId, Vec<[f64; 3]>>,
    node_components: &[ComponentId],
    node_positions: &[[f64; 3]],
    max_chunk: usize,
    importance: Option<&BTreeMap<ComponentId, f64>>,
) -> Vec<f64> {
    let mut distances = vec![initial_distance(); node_positions.len()];

    for (component, local_points) in component_surface_points {
        let indices: Vec<usize> = node_components
            .iter()
            .enumerate()
            .filter(|(_, c)| *c == component)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }
        let positions: Vec<[f64; 3]> = indices.iter().map(|&i| node_positions[i]).collect();
        let component_distances = compute_component_distance(process_group, local_points, &positions, max_chunk);
        for (slot, &i) in indices.iter().enumerate() {
            distances[i] = component_distances[slot];
        }
    }

    if let Some(importance) = importance {
        for (i, component) in node_components.iter().enumerate() {
            if let Some(&imp) = importance.get(component) {
                let divisor = 1.1 * imp;
                if divisor > 0.0 {
                    distances[i] /= divisor;
                }
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SingleRankGroup;

    #[test]
    fn nearest_surface_distance_matches_euclidean() {
        let group = SingleRankGroup::new();
        let surface = vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]];
        let queries = vec![[1.0, 0.0, 0.0], [9.0, 0.0, 0.0]];
        let distances = compute_component_distance(&group, &surface, &queries, 50_000);
        assert!((distances[0] - 1.0).abs() < 1e-9);
        assert!((distances[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn chunking_covers_the_full_surface_set() {
        let group = SingleRankGroup::new();
        let surface: Vec<[f64; 3]> = (0..10).map(|i| [i as f64, 0.0, 0.0]).collect();
        let queries = vec![[9.0, 0.0, 0.0]];
        // max_chunk = 2 forces 5 rounds; the nearest point (9,0,0) only
        // shows up in the last chunk, so the running minimum must still
        // find it.
        let distances = compute_component_distance(&group, &surface, &queries, 2);
        assert!((distances[0] - 0.0).abs() < 1e-9);
    }

    #[test]
    fn wall_distance_only_uses_the_node_s_own_component_surface() {
        let group = SingleRankGroup::new();
        let mut component_surface = BTreeMap::new();
        component_surface.insert(ComponentId(0), vec![[0.0, 0.0, 0.0]]);
        component_surface.insert(ComponentId(1), vec![[100.0, 0.0, 0.0]]);

        let node_components = vec![ComponentId(0), ComponentId(1)];
        let node_positions = vec![[1.0, 0.0, 0.0], [101.0, 0.0, 0.0]];

        let distances = compute_wall_distances(&group, &component_surface, &node_components, &node_positions, 50_000, None);
        assert!((distances[0] - 1.0).abs() < 1e-9);
        assert!((distances[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn importance_rescale_shortens_distance() {
        let group = SingleRankGroup::new();
        let mut component_surface = BTreeMap::new();
        component_surface.insert(ComponentId(0), vec![[0.0, 0.0, 0.0]]);
        let node_components = vec![ComponentId(0)];
        let node_positions = vec![[2.2, 0.0, 0.0]];
        let mut importance = BTreeMap::new();
        importance.insert(ComponentId(0), 2.0);

        let distances = compute_wall_distances(
            &group,
            &component_surface,
            &node_components,
            &node_positions,
            50_000,
            Some(&importance),
        );
        // 2.2 / (1.1 * 2.0) == 1.0
        assert!((distances[0] - 1.0).abs() < 1e-9);
    }
}
