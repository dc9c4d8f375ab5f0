//! Distributed donor search (spec.md §4.7).
//!
//! Grounded on `original_source/yoga/src/OverlapDetector.h` for the
//! extent-index query-routing shape, layered on this crate's
//! [`crate::spatial::Octree`] for the per-component extent tree.

mod finder;

pub use finder::{
    default_query_chunk_size, run_distributed_query, run_distributed_query_chunked, CandidateReport, DonorCandidate,
    DonorFinder, QueryPoint,
};
