//! The SPMD process-group abstraction (spec.md §5): every collective named
//! there (`Gather`, `Broadcast`, `ElementalMax`, `ParallelSum`,
//! `ParallelMin`, `Barrier`) plus the paired all-to-all `Exchange` used by
//! the fragment balancer, donor finder and inverse-receptor phases.
//!
//! Grounded on the corpus's feature-gated optional `mpi` dependency
//! (`examples/other_examples/manifests/skailasa-green-kernels`): the
//! default build never touches `rsmpi` and exercises the whole pipeline
//! through [`SingleRankGroup`], matching spec.md §5's "within a rank,
//! execution is sequential" — a single-rank group is always a valid
//! process group of size one.

mod single_rank;

#[cfg(feature = "mpi")]
mod mpi_group;

pub use single_rank::SingleRankGroup;

#[cfg(feature = "mpi")]
pub use mpi_group::MpiGroup;

use serde::{de::DeserializeOwned, Serialize};

use crate::mesh::Rank;

/// Bound shared by every generic collective payload: `bincode` is what
/// actually moves these bytes over the wire on the `mpi`-backed group
/// (spec.md §5 "opaque" shared buffers; SPEC_FULL.md §B serialization).
pub trait Wire: Serialize + DeserializeOwned + Clone + Send {}
impl<T: Serialize + DeserializeOwned + Clone + Send> Wire for T {}

/// SPMD process group collectives (spec.md §5).
///
/// Every method here is a suspension point that may block until every peer
/// arrives, except [`ProcessGroup::exchange`] which this crate uses as the
/// one non-blocking-shaped primitive in the receptor-update path (spec.md
/// §5 "Non-blocking send/recv are used in the receptor-update path only"):
/// it still blocks internally, but callers treat it as a single logical
/// step rather than a send/recv pair they sequence by hand.
pub trait ProcessGroup {
    fn rank(&self) -> Rank;
    fn size(&self) -> usize;

    fn barrier(&self);

    /// Broadcasts `value` from `root` to every rank.
    fn broadcast(&self, value: &mut String, root: Rank);

    /// Gathers one `Vec<T>` per rank onto `root`; non-root ranks receive an
    /// empty outer vector.
    fn gather<T: Wire>(&self, local: &[T], root: Rank) -> Vec<Vec<T>>;

    /// Element-wise maximum of `local` across every rank (spec.md §4.4 hole
    /// map crossing-mark sync).
    fn elemental_max(&self, local: &[i32]) -> Vec<i32>;

    fn parallel_sum_i64(&self, local: i64) -> i64;
    fn parallel_sum_usize(&self, local: usize) -> usize;
    fn parallel_min_f64(&self, local: f64) -> f64;
    fn parallel_max_i64(&self, local: i64) -> i64;

    /// All-to-all keyed exchange: `outgoing[target_rank]` is shipped to
    /// `target_rank`, and this call returns, keyed by sender rank, what
    /// every other rank sent to `self.rank()` (spec.md §4.6 step 5, §4.7's
    /// two-hop query/candidate exchange, §4.10's donor/weight round-trip).
    fn exchange<T: Wire>(&self, outgoing: std::collections::BTreeMap<Rank, Vec<T>>) -> std::collections::BTreeMap<Rank, Vec<T>>;
}
