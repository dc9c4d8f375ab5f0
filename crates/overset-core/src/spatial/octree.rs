use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::geometry::Extent;

/// Shared interface for octree payload items (spec.md §9 "polymorphic
/// geometry segments ... express as a tagged variant with a shared
/// interface {extent, closest-point, intersects-extent} rather than an
/// inheritance hierarchy").
pub trait OctreePayload {
    fn extent(&self) -> Extent;
    /// Closest point on the item to `q`. Only meaningful for items used in
    /// nearest-surface queries (surface segments); a containment-only
    /// payload (e.g. a cell extent in the donor finder) can return `q`
    /// itself since its distance is never consulted.
    fn closest_point(&self, q: [f64; 3]) -> [f64; 3];
}

/// A 1D line segment surface element.
#[derive(Debug, Clone, Copy)]
pub struct LineSegment {
    pub a: [f64; 3],
    pub b: [f64; 3],
}

impl OctreePayload for LineSegment {
    fn extent(&self) -> Extent {
        Extent::from_points([self.a, self.b]).unwrap()
    }

    fn closest_point(&self, q: [f64; 3]) -> [f64; 3] {
        closest_point_on_segment(self.a, self.b, q)
    }
}

/// A flat triangular surface facet.
#[derive(Debug, Clone, Copy)]
pub struct TriangleFacet {
    pub a: [f64; 3],
    pub b: [f64; 3],
    pub c: [f64; 3],
}

impl OctreePayload for TriangleFacet {
    fn extent(&self) -> Extent {
        Extent::from_points([self.a, self.b, self.c]).unwrap()
    }

    fn closest_point(&self, q: [f64; 3]) -> [f64; 3] {
        closest_point_on_triangle(self.a, self.b, self.c, q)
    }
}

/// A 6-node (TRI6-style) quadratic triangle, represented by its 3 corners
/// and 3 mid-edge nodes. Closest point is approximated by subdividing into
/// the 4 linear sub-triangles formed by the corners and mid-edges and
/// taking the closest point over those — exact for the common case where
/// the quadratic deviation from the flat facet is small, which is the
/// regime this index is used in (surface proximity queries, not exact
/// geometric reconstruction).
#[derive(Debug, Clone, Copy)]
pub struct QuadraticTriangle {
    pub corners: [[f64; 3]; 3],
    pub mid_edges: [[f64; 3]; 3],
}

impl QuadraticTriangle {
    fn sub_triangles(&self) -> [TriangleFacet; 4] {
        let [a, b, c] = self.corners;
        let [ab, bc, ca] = self.mid_edges;
        [
            TriangleFacet { a, b: ab, c: ca },
            TriangleFacet { a: ab, b, c: bc },
            TriangleFacet { a: ca, b: bc, c },
            TriangleFacet { a: ab, b: bc, c: ca },
        ]
    }
}

impl OctreePayload for QuadraticTriangle {
    fn extent(&self) -> Extent {
        let mut pts = self.corners.to_vec();
        pts.extend(self.mid_edges);
        Extent::from_points(pts).unwrap()
    }

    fn closest_point(&self, q: [f64; 3]) -> [f64; 3] {
        self.sub_triangles()
            .iter()
            .map(|t| t.closest_point(q))
            .min_by(|p, r| dist2(*p, q).partial_cmp(&dist2(*r, q)).unwrap())
            .unwrap()
    }
}

/// Tagged-variant payload covering every surface element kind the hole map
/// and distance calculator index.
#[derive(Debug, Clone, Copy)]
pub enum GeomSegment {
    Line(LineSegment),
    Triangle(TriangleFacet),
    QuadraticTriangle(QuadraticTriangle),
}

impl OctreePayload for GeomSegment {
    fn extent(&self) -> Extent {
        match self {
            GeomSegment::Line(s) => s.extent(),
            GeomSegment::Triangle(s) => s.extent(),
            GeomSegment::QuadraticTriangle(s) => s.extent(),
        }
    }

    fn closest_point(&self, q: [f64; 3]) -> [f64; 3] {
        match self {
            GeomSegment::Line(s) => s.closest_point(q),
            GeomSegment::Triangle(s) => s.closest_point(q),
            GeomSegment::QuadraticTriangle(s) => s.closest_point(q),
        }
    }
}

fn dist2(p: [f64; 3], q: [f64; 3]) -> f64 {
    (0..3).map(|i| (p[i] - q[i]).powi(2)).sum()
}

fn closest_point_on_segment(a: [f64; 3], b: [f64; 3], q: [f64; 3]) -> [f64; 3] {
    let ab: [f64; 3] = std::array::from_fn(|i| b[i] - a[i]);
    let aq: [f64; 3] = std::array::from_fn(|i| q[i] - a[i]);
    let ab2 = ab.iter().map(|v| v * v).sum::<f64>();
    if ab2 <= f64::EPSILON {
        return a;
    }
    let t = (ab.iter().zip(aq.iter()).map(|(x, y)| x * y).sum::<f64>() / ab2).clamp(0.0, 1.0);
    std::array::from_fn(|i| a[i] + t * ab[i])
}

/// Closest point on a flat triangle to `q`, via barycentric clamping.
fn closest_point_on_triangle(a: [f64; 3], b: [f64; 3], c: [f64; 3], q: [f64; 3]) -> [f64; 3] {
    let sub = |p: [f64; 3], r: [f64; 3]| -> [f64; 3] { std::array::from_fn(|i| p[i] - r[i]) };
    let dot = |p: [f64; 3], r: [f64; 3]| -> f64 { (0..3).map(|i| p[i] * r[i]).sum() };

    let ab = sub(b, a);
    let ac = sub(c, a);
    let ap = sub(q, a);
    let d1 = dot(ab, ap);
    let d2 = dot(ac, ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = sub(q, b);
    let d3 = dot(ab, bp);
    let d4 = dot(ac, bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return std::array::from_fn(|i| a[i] + v * ab[i]);
    }

    let cp = sub(q, c);
    let d5 = dot(ab, cp);
    let d6 = dot(ac, cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return std::array::from_fn(|i| a[i] + w * ac[i]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        let bc = sub(c, b);
        return std::array::from_fn(|i| b[i] + w * bc[i]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    std::array::from_fn(|i| a[i] + v * ab[i] + w * ac[i])
}

struct OctreeNode {
    extent: Extent,
    /// `None` on a leaf; always exactly 8 children otherwise, in the
    /// canonical bit order of `Extent::octant_children`.
    children: Option<Box<[OctreeNode; 8]>>,
    items: Vec<usize>,
}

/// Octree with payload (spec.md §4.2).
///
/// The root extent is made isotropic and expanded by 0.1% (avoids boundary
/// coincidence between a payload item sitting exactly on a face). A leaf
/// subdivides into 8 children once it holds more than `max_leaf_items`
/// (default 20); items that straddle a split plane are inserted into every
/// overlapping child, so a single item's index can appear in more than one
/// leaf.
pub struct Octree<T: OctreePayload> {
    root: OctreeNode,
    payload: Vec<T>,
    max_leaf_items: usize,
}

const DEFAULT_MAX_LEAF_ITEMS: usize = 20;

impl<T: OctreePayload> Octree<T> {
    pub fn build(payload: Vec<T>) -> Self {
        Self::build_with_capacity(payload, DEFAULT_MAX_LEAF_ITEMS)
    }

    pub fn build_with_capacity(payload: Vec<T>, max_leaf_items: usize) -> Self {
        let root_extent = payload
            .iter()
            .map(OctreePayload::extent)
            .reduce(|mut a, b| {
                a.engulf(b);
                a
            })
            .unwrap_or(Extent::new([0.0; 3], [0.0; 3]))
            .made_isotropic_and_expanded(1.0e-3);

        let mut root = OctreeNode {
            extent: root_extent,
            children: None,
            items: (0..payload.len()).collect(),
        };
        subdivide_if_needed(&mut root, &payload, max_leaf_items);

        Octree {
            root,
            payload,
            max_leaf_items,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn payload(&self) -> &[T] {
        &self.payload
    }

    pub fn root_extent(&self) -> Extent {
        self.root.extent
    }

    /// Best-first nearest-surface-point query: iterative traversal of a
    /// min-heap keyed by the squared distance from `q` to each voxel's
    /// clamp-to-extent point, pruning subtrees whose optimistic bound is
    /// already worse than the best point found so far.
    pub fn nearest_point(&self, q: [f64; 3]) -> Option<(usize, [f64; 3], f64)> {
        if self.payload.is_empty() {
            return None;
        }

        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
        heap.push(HeapEntry {
            neg_key: -self.root.extent.distance_squared_to(q),
            node: &self.root,
        });

        let mut best: Option<(usize, [f64; 3], f64)> = None;

        while let Some(HeapEntry { neg_key, node }) = heap.pop() {
            let bound = -neg_key;
            if let Some((_, _, best_d2)) = best {
                if bound > best_d2 {
                    // Every remaining entry in the heap is at least this
                    // far; since the heap is a max-heap on -bound, nothing
                    // popped afterwards can beat `best` either.
                    break;
                }
            }

            match &node.children {
                Some(children) => {
                    for child in children.iter() {
                        if child.items.is_empty() && child.children.is_none() {
                            continue;
                        }
                        let d2 = child.extent.distance_squared_to(q);
                        if let Some((_, _, best_d2)) = best {
                            if d2 > best_d2 {
                                continue;
                            }
                        }
                        heap.push(HeapEntry {
                            neg_key: -d2,
                            node: child,
                        });
                    }
                }
                None => {
                    for &idx in &node.items {
                        let p = self.payload[idx].closest_point(q);
                        let d2 = dist2(p, q);
                        if best.is_none_or(|(_, _, b)| d2 < b) {
                            best = Some((idx, p, d2));
                        }
                    }
                }
            }
        }

        best
    }

    /// Retrieves all leaf items whose extent intersects `query_extent`
    /// (spec.md §4.2 containment query), deduplicated since straddling
    /// items can live in multiple leaves.
    pub fn query_overlapping(&self, query_extent: &Extent) -> Vec<usize> {
        let mut out = Vec::new();
        let mut seen = rustc_hash::FxHashSet::default();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !node.extent.intersects(query_extent) {
                continue;
            }
            match &node.children {
                Some(children) => stack.extend(children.iter()),
                None => {
                    for &idx in &node.items {
                        if self.payload[idx].extent().intersects(query_extent) && seen.insert(idx) {
                            out.push(idx);
                        }
                    }
                }
            }
        }
        out
    }

    #[cfg(test)]
    fn max_leaf_items(&self) -> usize {
        self.max_leaf_items
    }
}

struct HeapEntry<'a> {
    neg_key: f64,
    node: &'a OctreeNode,
}

impl PartialEq for HeapEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.neg_key == other.neg_key
    }
}
impl Eq for HeapEntry<'_> {}
impl PartialOrd for HeapEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.neg_key.partial_cmp(&other.neg_key)
    }
}
impl Ord for HeapEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

fn subdivide_if_needed<T: OctreePayload>(node: &mut OctreeNode, payload: &[T], max_leaf_items: usize) {
    if node.items.len() <= max_leaf_items {
        return;
    }
    let child_extents = node.extent.octant_children();
    let mut children: [OctreeNode; 8] = std::array::from_fn(|i| OctreeNode {
        extent: child_extents[i],
        children: None,
        items: Vec::new(),
    });

    for &idx in &node.items {
        let item_extent = payload[idx].extent();
        for child in children.iter_mut() {
            if child.extent.intersects(&item_extent) {
                child.items.push(idx);
            }
        }
    }

    node.items.clear();
    for child in children.iter_mut() {
        subdivide_if_needed(child, payload, max_leaf_items);
    }
    node.children = Some(Box::new(children));
}
