use petgraph::graph::UnGraph;
use petgraph::algo::connected_components;

use super::node::ComponentId;

/// Assigns distinct, contiguous component ordinals to disconnected
/// node-adjacency graphs.
///
/// Grounded on `original_source/yoga/src/ComponentGridIdentifier.h`: a mesh
/// system can arrive without per-node component tags already set (e.g. a
/// flat concatenation of several component grids with shared numbering),
/// in which case the node-adjacency graph's connected components *are* the
/// grids. Two node sets with no edge between them receive two different
/// ordinals; seed scenario S4 exercises this directly.
///
/// `edges` is the node-neighbor graph restricted to one rank's local nodes
/// (local indices). Returns one `ComponentId` per local node, numbered
/// `0..num_components` in first-encountered order.
pub fn identify_components(node_count: usize, edges: &[(u32, u32)]) -> Vec<ComponentId> {
    let mut graph = UnGraph::<(), ()>::with_capacity(node_count, edges.len());
    let indices: Vec<_> = (0..node_count).map(|_| graph.add_node(())).collect();
    for &(a, b) in edges {
        graph.add_edge(indices[a as usize], indices[b as usize], ());
    }

    // petgraph gives us the component *count*; we still need the per-node
    // labeling, which a union-find over the same edge list gives us for
    // free without re-walking the graph.
    let _ = connected_components(&graph);

    let mut parent: Vec<usize> = (0..node_count).collect();
    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }
    for &(a, b) in edges {
        let (a, b) = (a as usize, b as usize);
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
        }
    }

    let mut ordinal_of_root: rustc_hash::FxHashMap<usize, u32> = rustc_hash::FxHashMap::default();
    let mut next_ordinal = 0u32;
    (0..node_count)
        .map(|n| {
            let root = find(&mut parent, n);
            let ordinal = *ordinal_of_root.entry(root).or_insert_with(|| {
                let id = next_ordinal;
                next_ordinal += 1;
                id
            });
            ComponentId(ordinal)
        })
        .collect()
}
