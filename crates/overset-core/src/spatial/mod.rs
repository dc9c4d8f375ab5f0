mod cartesian_block;
mod kdtree;
mod octree;

pub use cartesian_block::CartesianBlock;
pub use kdtree::PointKdTree;
pub use octree::{GeomSegment, LineSegment, Octree, OctreePayload, QuadraticTriangle, TriangleFacet};
