//! Chunked parallel nearest-surface distance (spec.md §4.8).
//!
//! Grounded on `original_source/yoga/src/NanoFlannDistanceCalculator.h` and
//! `ChunkedPointGatherer.h` for the "gather chunk, build local tree, take
//! running min" shape, implemented over this crate's
//! [`crate::spatial::PointKdTree`].

mod calculator;

pub use calculator::{compute_component_distance, compute_wall_distances};
