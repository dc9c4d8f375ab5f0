//! Serializable mesh sub-regions shipped between ranks during balancing and
//! donor search (spec.md §4.5).
//!
//! Grounded on `original_source/yoga/src/VoxelFragment.h`: a fragment is a
//! self-contained re-indexed slice of a [`crate::mesh::MeshView`] — just
//! enough geometry and bookkeeping to be balanced, searched and discarded
//! without ever touching the full mesh again.

mod voxel_fragment;

pub use voxel_fragment::{FragmentCell, TransferNode, VoxelFragment};
