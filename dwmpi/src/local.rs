use crate::Comm;
use std::ops::AddAssign;
use std::sync::{Arc, Barrier, Mutex};
use types::c64;

struct Shared {
    size: usize,
    barrier: Barrier,
    acc_f64: Mutex<Vec<f64>>,
    acc_c64: Mutex<Vec<c64>>,
}

/// In-process communicator group: one `LocalComm` per rank, each driven by
/// its own thread. Every collective must be entered by all ranks.
pub struct LocalGroup;

impl LocalGroup {
    pub fn new(size: usize) -> Vec<LocalComm> {
        assert!(size > 0, "communicator group needs at least one rank");

        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            acc_f64: Mutex::new(Vec::new()),
            acc_c64: Mutex::new(Vec::new()),
        });

        (0..size)
            .map(|rank| LocalComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    fn all_reduce<T>(&self, acc: &Mutex<Vec<T>>, buf: &mut [T])
    where
        T: Copy + Default + AddAssign,
    {
        let barrier = &self.shared.barrier;

        if self.rank == 0 {
            let mut a = acc.lock().unwrap_or_else(|e| e.into_inner());
            a.clear();
            a.resize(buf.len(), T::default());
        }

        barrier.wait();

        {
            let mut a = acc.lock().unwrap_or_else(|e| e.into_inner());

            assert_eq!(a.len(), buf.len(), "reduction buffers differ in length");

            for (s, x) in a.iter_mut().zip(buf.iter()) {
                *s += *x;
            }
        }

        barrier.wait();

        {
            let a = acc.lock().unwrap_or_else(|e| e.into_inner());
            buf.copy_from_slice(&a);
        }

        // nobody may reset the accumulator before all ranks have read it
        barrier.wait();
    }
}

impl Comm for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn sum_f64(&self, buf: &mut [f64]) {
        log::trace!("rank {} sum_f64 len {}", self.rank, buf.len());

        self.all_reduce(&self.shared.acc_f64, buf);
    }

    fn sum_c64(&self, buf: &mut [c64]) {
        log::trace!("rank {} sum_c64 len {}", self.rank, buf.len());

        self.all_reduce(&self.shared.acc_c64, buf);
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_group_sum() {
        let comms = LocalGroup::new(3);

        let results: Vec<Vec<f64>> = std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .iter()
                .map(|comm| {
                    s.spawn(move || {
                        let mut v = vec![comm.rank() as f64, 1.0];
                        comm.sum_f64(&mut v);

                        // second reduction reuses the accumulator
                        let mut w = vec![c64::new(0.0, comm.rank() as f64)];
                        comm.sum_c64(&mut w);
                        v.push(w[0].im);

                        v
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for v in results {
            assert_eq!(v, vec![3.0, 3.0, 3.0]);
        }
    }
}
