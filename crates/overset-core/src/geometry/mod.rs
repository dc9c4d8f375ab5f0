/// Scalar abstraction letting the core algorithms run identically over real
/// coordinates and complex-differentiated coordinates (spec.md §9).
///
/// The algorithms themselves (Newton iteration, least squares, octree
/// traversal) are generic over `Scalar`; only a handful of leaf operations
/// (norms, comparisons used for pruning) need the real part, exposed via
/// `re()`.
mod extent;
mod point;
mod scalar;

pub use extent::Extent;
pub use point::Point;
pub use scalar::Scalar;
