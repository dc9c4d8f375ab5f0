use std::collections::BTreeMap;

use mpi::datatype::PartitionMut;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::mesh::Rank;

use super::{ProcessGroup, Wire};

/// `rsmpi`-backed process group, enabled by the `mpi` feature (SPEC_FULL.md
/// §B). Every collective payload crosses the wire as `bincode`-encoded
/// bytes, since the collectives here are generic over arbitrary
/// `Serialize`/`Deserialize` payloads (voxel fragments, query-point
/// batches, candidate-donor batches) rather than raw numeric buffers.
pub struct MpiGroup {
    world: SimpleCommunicator,
}

impl MpiGroup {
    /// Wraps the world communicator of an already-initialized MPI universe.
    /// Initializing the universe itself is left to the host application,
    /// the same way the teacher's optional `mpi` feature never calls
    /// `mpi::initialize()` on the caller's behalf.
    pub fn world() -> Self {
        MpiGroup {
            world: mpi::environment::universe()
                .expect("MPI universe not initialized before constructing MpiGroup")
                .world(),
        }
    }
}

fn encode<T: Wire>(items: &[T]) -> Vec<u8> {
    bincode::serialize(items).expect("bincode serialization of a Wire payload cannot fail")
}

fn decode<T: Wire>(bytes: &[u8]) -> Vec<T> {
    bincode::deserialize(bytes).expect("peer sent a payload this rank could not decode")
}

impl ProcessGroup for MpiGroup {
    fn rank(&self) -> Rank {
        Rank(self.world.rank() as u32)
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn barrier(&self) {
        self.world.barrier();
    }

    fn broadcast(&self, value: &mut String, root: Rank) {
        let mut len = value.len() as i32;
        self.world
            .process_at_rank(root.0 as i32)
            .broadcast_into(&mut len);
        let mut bytes = std::mem::take(value).into_bytes();
        bytes.resize(len as usize, 0);
        self.world
            .process_at_rank(root.0 as i32)
            .broadcast_into(&mut bytes[..]);
        *value = String::from_utf8(bytes).expect("broadcast config text must be valid UTF-8");
    }

    fn gather<T: Wire>(&self, local: &[T], root: Rank) -> Vec<Vec<T>> {
        let payload = encode(local);
        let my_len = payload.len() as i32;

        if self.rank() == root {
            let mut lens = vec![0i32; self.size()];
            self.world
                .process_at_rank(root.0 as i32)
                .gather_into_root(&my_len, &mut lens);

            let displs: Vec<i32> = lens
                .iter()
                .scan(0i32, |acc, &l| {
                    let d = *acc;
                    *acc += l;
                    Some(d)
                })
                .collect();
            let mut buf = vec![0u8; lens.iter().sum::<i32>() as usize];
            {
                let mut partition = PartitionMut::new(&mut buf[..], lens.clone(), displs.clone());
                self.world
                    .process_at_rank(root.0 as i32)
                    .gather_varcount_into_root(&payload[..], &mut partition);
            }

            (0..self.size())
                .map(|r| {
                    let start = displs[r] as usize;
                    let end = start + lens[r] as usize;
                    decode(&buf[start..end])
                })
                .collect()
        } else {
            self.world
                .process_at_rank(root.0 as i32)
                .gather_into(&my_len);
            self.world
                .process_at_rank(root.0 as i32)
                .gather_varcount_into(&payload[..]);
            Vec::new()
        }
    }

    fn elemental_max(&self, local: &[i32]) -> Vec<i32> {
        let mut out = local.to_vec();
        self.world
            .all_reduce_into(local, &mut out[..], &mpi::collective::SystemOperation::max());
        out
    }

    fn parallel_sum_i64(&self, local: i64) -> i64 {
        let mut out = 0i64;
        self.world
            .all_reduce_into(&local, &mut out, &mpi::collective::SystemOperation::sum());
        out
    }

    fn parallel_sum_usize(&self, local: usize) -> usize {
        self.parallel_sum_i64(local as i64) as usize
    }

    fn parallel_min_f64(&self, local: f64) -> f64 {
        let mut out = 0.0f64;
        self.world
            .all_reduce_into(&local, &mut out, &mpi::collective::SystemOperation::min());
        out
    }

    fn parallel_max_i64(&self, local: i64) -> i64 {
        let mut out = 0i64;
        self.world
            .all_reduce_into(&local, &mut out, &mpi::collective::SystemOperation::max());
        out
    }

    fn exchange<T: Wire>(&self, outgoing: BTreeMap<Rank, Vec<T>>) -> BTreeMap<Rank, Vec<T>> {
        let n = self.size();
        let payloads: Vec<Vec<u8>> = (0..n)
            .map(|r| match outgoing.get(&Rank(r as u32)) {
                Some(items) => encode(items),
                None => Vec::new(),
            })
            .collect();

        let send_lens: Vec<i32> = payloads.iter().map(|p| p.len() as i32).collect();
        let mut recv_lens = vec![0i32; n];
        self.world.all_to_all_into(&send_lens, &mut recv_lens);

        let send_displs: Vec<i32> = send_lens
            .iter()
            .scan(0i32, |acc, &l| {
                let d = *acc;
                *acc += l;
                Some(d)
            })
            .collect();
        let recv_displs: Vec<i32> = recv_lens
            .iter()
            .scan(0i32, |acc, &l| {
                let d = *acc;
                *acc += l;
                Some(d)
            })
            .collect();

        let mut send_buf = Vec::with_capacity(send_lens.iter().sum::<i32>() as usize);
        for p in &payloads {
            send_buf.extend_from_slice(p);
        }
        let mut recv_buf = vec![0u8; recv_lens.iter().sum::<i32>() as usize];

        let send_partition = mpi::datatype::Partition::new(&send_buf[..], send_lens.clone(), send_displs.clone());
        let mut recv_partition = PartitionMut::new(&mut recv_buf[..], recv_lens.clone(), recv_displs.clone());
        self.world.all_to_all_varcount_into(&send_partition, &mut recv_partition);

        (0..n)
            .filter(|&r| recv_lens[r] > 0)
            .map(|r| {
                let start = recv_displs[r] as usize;
                let end = start + recv_lens[r] as usize;
                (Rank(r as u32), decode(&recv_buf[start..end]))
            })
            .collect()
    }
}
