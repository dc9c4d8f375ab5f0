use std::collections::BTreeMap;

use crate::mesh::Rank;

use super::{ProcessGroup, Wire};

/// A process group of exactly one rank. Every collective is a local no-op
/// that hands the caller's own data back, which lets every pipeline stage
/// run — and be tested — without linking `rsmpi` (spec.md §5).
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleRankGroup;

impl SingleRankGroup {
    pub fn new() -> Self {
        SingleRankGroup
    }
}

impl ProcessGroup for SingleRankGroup {
    fn rank(&self) -> Rank {
        Rank(0)
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn broadcast(&self, _value: &mut String, _root: Rank) {}

    fn gather<T: Wire>(&self, local: &[T], _root: Rank) -> Vec<Vec<T>> {
        vec![local.to_vec()]
    }

    fn elemental_max(&self, local: &[i32]) -> Vec<i32> {
        local.to_vec()
    }

    fn parallel_sum_i64(&self, local: i64) -> i64 {
        local
    }

    fn parallel_sum_usize(&self, local: usize) -> usize {
        local
    }

    fn parallel_min_f64(&self, local: f64) -> f64 {
        local
    }

    fn parallel_max_i64(&self, local: i64) -> i64 {
        local
    }

    fn exchange<T: Wire>(&self, mut outgoing: BTreeMap<Rank, Vec<T>>) -> BTreeMap<Rank, Vec<T>> {
        let mine = outgoing.remove(&Rank(0)).unwrap_or_default();
        let mut incoming = BTreeMap::new();
        incoming.insert(Rank(0), mine);
        incoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_group_is_size_one_at_rank_zero() {
        let g = SingleRankGroup::new();
        assert_eq!(g.rank(), Rank(0));
        assert_eq!(g.size(), 1);
    }

    #[test]
    fn gather_returns_one_bucket_with_local_data() {
        let g = SingleRankGroup::new();
        let out = g.gather(&[1, 2, 3], Rank(0));
        assert_eq!(out, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn exchange_round_trips_local_entry() {
        let g = SingleRankGroup::new();
        let mut outgoing = BTreeMap::new();
        outgoing.insert(Rank(0), vec!["a", "b"]);
        let incoming = g.exchange(outgoing);
        assert_eq!(incoming[&Rank(0)], vec!["a", "b"]);
    }
}
