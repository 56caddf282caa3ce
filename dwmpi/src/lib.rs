//! Communicator abstraction for work partitioning and sum reductions.
//!
//! A communicator is always an explicit argument. `SerialComm` is the
//! single-rank case; `LocalGroup` runs ranks as threads of one process with
//! real collective semantics.

mod local;
pub use local::*;

use std::ops::Range;
use types::c64;

pub trait Comm {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// All-reduce: every rank ends up with the element-wise sum.
    fn sum_f64(&self, buf: &mut [f64]);

    /// All-reduce: every rank ends up with the element-wise sum.
    fn sum_c64(&self, buf: &mut [c64]);

    fn barrier(&self);

    /// Contiguous block of `0..n` owned by this rank.
    fn block_range(&self, n: usize) -> Range<usize> {
        block_range(n, self.rank(), self.size())
    }
}

pub fn is_root(comm: &dyn Comm) -> bool {
    comm.rank() == 0
}

/// Split `0..n` into `size` contiguous blocks; the first `n % size` blocks
/// carry one extra index.
pub fn block_range(n: usize, rank: usize, size: usize) -> Range<usize> {
    assert!(rank < size, "rank {} outside communicator of size {}", rank, size);

    let base = n / size;
    let rest = n % size;

    let start = rank * base + rank.min(rest);
    let len = base + usize::from(rank < rest);

    start..start + len
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SerialComm;

impl SerialComm {
    pub fn new() -> SerialComm {
        SerialComm
    }
}

impl Comm for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn sum_f64(&self, _buf: &mut [f64]) {}

    fn sum_c64(&self, _buf: &mut [c64]) {}

    fn barrier(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_range_covers_everything_once() {
        for n in [0, 1, 7, 104, 1001] {
            for size in 1..6 {
                let mut owner = vec![0; n];

                for rank in 0..size {
                    for i in block_range(n, rank, size) {
                        owner[i] += 1;
                    }
                }

                assert!(owner.iter().all(|c| *c == 1), "n = {} size = {}", n, size);
            }
        }
    }

    #[test]
    fn test_block_range_is_balanced() {
        let sizes: Vec<usize> = (0..4).map(|r| block_range(10, r, 4).len()).collect();

        assert_eq!(sizes, vec![3, 3, 2, 2]);
    }

    #[test]
    fn test_serial_comm() {
        let comm = SerialComm::new();

        let mut v = vec![1.0, 2.0];
        comm.sum_f64(&mut v);

        assert_eq!(v, vec![1.0, 2.0]);
        assert!(is_root(&comm));
        assert_eq!(comm.block_range(5), 0..5);
    }
}
