//! Deterministic random number generation for model training.
//!
//! RULE: Training never calls any platform RNG.
//! All randomness flows through `TrainingRng` streams derived from the
//! configured forest seed, so a given seed always grows the same forest.
//!
//! Each consumer gets its own stream, seeded from
//! (seed XOR stream_index * golden ratio constant):
//!   - stream 0 is the train/test split
//!   - stream 1 + t is the bootstrap sample of tree t

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub const SPLIT_STREAM: u64 = 0;

pub fn tree_stream(tree_index: usize) -> u64 {
    1 + tree_index as u64
}

pub struct TrainingRng {
    inner: Pcg64Mcg,
}

impl TrainingRng {
    pub fn new(seed: u64, stream: u64) -> Self {
        let derived_seed = seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a usize in [0, n).
    pub fn below(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        (self.inner.next_u64() % n as u64) as usize
    }

    /// Fisher–Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }

    /// `n` indices drawn from [0, n) with replacement.
    pub fn bootstrap(&mut self, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.below(n)).collect()
    }
}
